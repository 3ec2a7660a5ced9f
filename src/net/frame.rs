//! 帧与帧池
//!
//! 帧从预分配的帧池中取出，按槽位下标寻址。帧交付到最终目的地且原始发送方收到 ACK
//! 之后，槽位回到空闲链表等待复用。

use super::id::{EndpointId, FrameId, StationId};
use crate::sim::SimTime;

/// 帧的生命周期标志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameFlags {
    pub created: bool,
    pub transmitting: bool,
    /// 已交付到最终目的站点
    pub finished: bool,
    /// 原始发送方已收到 ACK
    pub acked: bool,
}

/// 帧的时间与碰撞记录
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTiming {
    pub created_at: SimTime,
    pub tx_start_at: Option<SimTime>,
    pub tx_finish_at: Option<SimTime>,
    pub delivered_at: Option<SimTime>,
    pub acked_at: Option<SimTime>,
    /// 当前这一跳上的碰撞次数（收到 ACK 后清零）
    pub hop_collisions: u32,
    /// 整个生命周期的碰撞次数
    pub total_collisions: u32,
}

/// 传输单元
#[derive(Debug, Clone)]
pub struct Frame {
    pub id: FrameId,
    pub size_bits: u64,
    pub src: StationId,
    pub dst: StationId,
    next_hop: Option<EndpointId>,
    prev_hop: EndpointId,
    pub flags: FrameFlags,
    pub timing: FrameTiming,
}

impl Frame {
    fn new(id: FrameId, src: StationId, dst: StationId, size_bits: u64, now: SimTime) -> Self {
        Self {
            id,
            size_bits,
            src,
            dst,
            next_hop: None,
            prev_hop: EndpointId::Station(src),
            flags: FrameFlags {
                created: true,
                ..FrameFlags::default()
            },
            timing: FrameTiming {
                created_at: now,
                ..FrameTiming::default()
            },
        }
    }

    pub fn next_hop(&self) -> Option<EndpointId> {
        self.next_hop
    }

    pub fn prev_hop(&self) -> EndpointId {
        self.prev_hop
    }

    /// 设置下一跳；原来的下一跳成为上一跳。设置为相同的下一跳不产生移位。
    pub fn set_next_hop(&mut self, next: EndpointId) {
        if self.next_hop == Some(next) {
            return;
        }
        if let Some(old) = self.next_hop {
            self.prev_hop = old;
        }
        self.next_hop = Some(next);
    }

    pub fn start_tx(&mut self, now: SimTime) {
        self.flags.transmitting = true;
        self.timing.tx_start_at = Some(now);
    }

    pub fn finish_tx(&mut self, now: SimTime) {
        self.flags.transmitting = false;
        self.timing.tx_finish_at = Some(now);
    }

    pub fn collide(&mut self) {
        self.flags.transmitting = false;
        self.timing.hop_collisions += 1;
        self.timing.total_collisions += 1;
    }

    pub fn mark_delivered(&mut self, now: SimTime) {
        self.flags.finished = true;
        self.timing.delivered_at = Some(now);
    }

    pub fn mark_acked(&mut self, now: SimTime) {
        self.flags.acked = true;
        self.timing.acked_at = Some(now);
        self.timing.hop_collisions = 0;
    }

    /// 帧已走完完整往返，可以回收
    pub fn is_complete(&self) -> bool {
        self.flags.finished && self.flags.acked
    }
}

#[derive(Debug, Clone)]
struct Slot {
    in_use: bool,
    frame: Option<Frame>,
}

/// 帧池：按下标寻址的帧槽位 + 空闲链表
#[derive(Debug, Default)]
pub struct FramePool {
    slots: Vec<Slot>,
    free: Vec<usize>,
    in_use: usize,
}

impl FramePool {
    /// 预分配 `capacity` 个槽位。全部占用后帧池会继续扩容。
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = vec![
            Slot {
                in_use: false,
                frame: None,
            };
            capacity
        ];
        // 逆序入栈，使 0 号槽位最先被取出
        let free = (0..capacity).rev().collect();
        Self {
            slots,
            free,
            in_use: 0,
        }
    }

    /// 取出一个空闲槽位并初始化帧
    pub fn alloc(&mut self, src: StationId, dst: StationId, size_bits: u64, now: SimTime) -> FrameId {
        let idx = match self.free.pop() {
            Some(idx) => idx,
            None => {
                self.slots.push(Slot {
                    in_use: false,
                    frame: None,
                });
                self.slots.len() - 1
            }
        };
        let id = FrameId(idx);
        let slot = &mut self.slots[idx];
        slot.in_use = true;
        slot.frame = Some(Frame::new(id, src, dst, size_bits, now));
        self.in_use += 1;
        id
    }

    /// 归还槽位。重复归还无效果。
    pub fn release(&mut self, id: FrameId) {
        let Some(slot) = self.slots.get_mut(id.0) else {
            return;
        };
        if !slot.in_use {
            return;
        }
        slot.in_use = false;
        self.free.push(id.0);
        self.in_use -= 1;
    }

    pub fn is_in_use(&self, id: FrameId) -> bool {
        self.slots.get(id.0).is_some_and(|s| s.in_use)
    }

    /// 获取正在使用的帧
    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.slots
            .get(id.0)
            .filter(|s| s.in_use)
            .and_then(|s| s.frame.as_ref())
    }

    pub fn get_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.slots
            .get_mut(id.0)
            .filter(|s| s.in_use)
            .and_then(|s| s.frame.as_mut())
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
