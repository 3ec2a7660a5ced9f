//! 泊松到达过程（Knuth 乘法法）

use rand::{Rng, RngCore};

use super::ArrivalProcess;

#[derive(Debug, Clone, Copy)]
pub struct PoissonArrivals {
    mean: f64,
    threshold: f64,
}

impl PoissonArrivals {
    pub fn new(mean: f64) -> Self {
        let mean = mean.max(0.0);
        Self {
            mean,
            threshold: (-mean).exp(),
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }
}

impl ArrivalProcess for PoissonArrivals {
    fn arrivals(&self, rng: &mut dyn RngCore) -> u32 {
        // 不断乘以 [0,1) 均匀数，直到乘积不超过 e^-mean；乘法次数减一即为结果。
        let mut product = 1.0f64;
        let mut k = 0u32;
        loop {
            k += 1;
            product *= rng.r#gen::<f64>();
            if product <= self.threshold {
                return k - 1;
            }
        }
    }
}
