use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IcType {
    /// All-zero interior (the reference run).
    #[default]
    Zero,
    /// Uniform noise in [0, 1).
    Noise,
    /// One gaussian bump.
    Gaussian,
}

impl IcType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IcType::Zero => "zero",
            IcType::Noise => "noise",
            IcType::Gaussian => "gaussian",
        }
    }
}

/// Interior values (len = intervals - 2). Boundaries come from the run parameters.
pub fn generate_interior<R: Rng>(rng: &mut R, len: usize, ic: IcType) -> Vec<f64> {
    let mut f = vec![0.0f64; len];

    match ic {
        IcType::Zero => {}

        IcType::Noise => {
            for v in f.iter_mut() {
                *v = rng.gen_range(0.0..1.0);
            }
        }

        IcType::Gaussian => {
            let n = len as f64;
            let center = rng.gen_range(0.2..0.8) * n;
            let sigma = (rng.gen_range(0.02..0.1) * n).max(1.0);
            let amp = rng.gen_range(0.5..1.0);

            for (i, v) in f.iter_mut().enumerate() {
                let d = i as f64 - center;
                *v = amp * (-0.5 * d * d / (sigma * sigma)).exp();
            }
        }
    }

    f
}
