//! Optimization Algorithms
//!
//! Update rules applied to the whole parameter set after each backward pass:
//! - Gradient descent (the baseline: `param -= lr * grad`)
//! - Gradient descent with momentum
//! - Adam (Adaptive Moment Estimation)

use ndarray::{Array, Dimension, Zip};
use serde::{Deserialize, Serialize};

use super::params::{Gradients, Parameters};
use crate::error::{Error, Result};

/// Optimizer trait for parameter updates
pub trait Optimizer: Send + Sync {
    /// Apply one update in place
    fn update(&mut self, params: &mut Parameters, grads: &Gradients) -> Result<()>;

    /// Reset optimizer state (for new training run)
    fn reset(&mut self);

    fn learning_rate(&self) -> f64;

    fn name(&self) -> &'static str;
}

fn check_learning_rate(learning_rate: f64) -> Result<()> {
    if !learning_rate.is_finite() || learning_rate <= 0.0 {
        return Err(Error::InvalidConfiguration(format!(
            "learning rate must be positive, got {}",
            learning_rate
        )));
    }
    Ok(())
}

/// Plain full-batch gradient descent, no momentum or adaptive scaling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientDescent {
    pub learning_rate: f64,
}

impl GradientDescent {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for GradientDescent {
    fn update(&mut self, params: &mut Parameters, grads: &Gradients) -> Result<()> {
        check_learning_rate(self.learning_rate)?;
        grads.check_matches(params)?;

        let lr = self.learning_rate;
        params.w1.scaled_add(-lr, &grads.w1);
        params.b1.scaled_add(-lr, &grads.b1);
        params.w2.scaled_add(-lr, &grads.w2);
        params.b2.scaled_add(-lr, &grads.b2);
        Ok(())
    }

    fn reset(&mut self) {}

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn name(&self) -> &'static str {
        "gradient_descent"
    }
}

/// Gradient descent with classical momentum: `v = mu * v - lr * g; p += v`
#[derive(Debug, Clone)]
pub struct Momentum {
    pub learning_rate: f64,
    pub momentum: f64,
    velocity: Option<Gradients>,
}

impl Momentum {
    pub fn new(learning_rate: f64, momentum: f64) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity: None,
        }
    }
}

fn momentum_update<D: Dimension>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    velocity: &mut Array<f64, D>,
    learning_rate: f64,
    momentum: f64,
) {
    Zip::from(param)
        .and(grad)
        .and(velocity)
        .for_each(|p, &g, v| {
            *v = momentum * *v - learning_rate * g;
            *p += *v;
        });
}

impl Optimizer for Momentum {
    fn update(&mut self, params: &mut Parameters, grads: &Gradients) -> Result<()> {
        check_learning_rate(self.learning_rate)?;
        grads.check_matches(params)?;

        let (lr, mu) = (self.learning_rate, self.momentum);
        let v = self
            .velocity
            .get_or_insert_with(|| Gradients::zeros_like(params));

        momentum_update(&mut params.w1, &grads.w1, &mut v.w1, lr, mu);
        momentum_update(&mut params.b1, &grads.b1, &mut v.b1, lr, mu);
        momentum_update(&mut params.w2, &grads.w2, &mut v.w2, lr, mu);
        momentum_update(&mut params.b2, &grads.b2, &mut v.b2, lr, mu);
        Ok(())
    }

    fn reset(&mut self) {
        self.velocity = None;
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn name(&self) -> &'static str {
        "momentum"
    }
}

/// Adam optimizer (Adaptive Moment Estimation)
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    t: i32,
    m: Option<Gradients>,
    v: Option<Gradients>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            t: 0,
            m: None,
            v: None,
        }
    }

    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }
}

struct AdamStep {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    bias_correction1: f64,
    bias_correction2: f64,
}

impl AdamStep {
    fn apply<D: Dimension>(
        &self,
        param: &mut Array<f64, D>,
        grad: &Array<f64, D>,
        m: &mut Array<f64, D>,
        v: &mut Array<f64, D>,
    ) {
        Zip::from(param)
            .and(grad)
            .and(m)
            .and(v)
            .for_each(|p, &g, m, v| {
                *m = self.beta1 * *m + (1.0 - self.beta1) * g;
                *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
                let m_hat = *m / self.bias_correction1;
                let v_hat = *v / self.bias_correction2;
                *p -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            });
    }
}

impl Optimizer for Adam {
    fn update(&mut self, params: &mut Parameters, grads: &Gradients) -> Result<()> {
        check_learning_rate(self.learning_rate)?;
        grads.check_matches(params)?;

        self.t += 1;
        let step = AdamStep {
            learning_rate: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            bias_correction1: 1.0 - self.beta1.powi(self.t),
            bias_correction2: 1.0 - self.beta2.powi(self.t),
        };

        let m = self.m.get_or_insert_with(|| Gradients::zeros_like(params));
        let v = self.v.get_or_insert_with(|| Gradients::zeros_like(params));

        step.apply(&mut params.w1, &grads.w1, &mut m.w1, &mut v.w1);
        step.apply(&mut params.b1, &grads.b1, &mut m.b1, &mut v.b1);
        step.apply(&mut params.w2, &grads.w2, &mut m.w2, &mut v.w2);
        step.apply(&mut params.b2, &grads.b2, &mut m.b2, &mut v.b2);
        Ok(())
    }

    fn reset(&mut self) {
        self.t = 0;
        self.m = None;
        self.v = None;
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn name(&self) -> &'static str {
        "adam"
    }
}

/// Serializable optimizer selection, paired with a learning rate at build time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerKind {
    GradientDescent,
    Momentum { momentum: f64 },
    Adam { beta1: f64, beta2: f64 },
}

impl Default for OptimizerKind {
    fn default() -> Self {
        OptimizerKind::GradientDescent
    }
}

impl OptimizerKind {
    pub fn validate(&self) -> Result<()> {
        let in_unit = |name: &str, value: f64| {
            if (0.0..1.0).contains(&value) {
                Ok(())
            } else {
                Err(Error::InvalidConfiguration(format!(
                    "{} must be in [0, 1), got {}",
                    name, value
                )))
            }
        };
        match *self {
            OptimizerKind::GradientDescent => Ok(()),
            OptimizerKind::Momentum { momentum } => in_unit("momentum", momentum),
            OptimizerKind::Adam { beta1, beta2 } => {
                in_unit("beta1", beta1)?;
                in_unit("beta2", beta2)
            }
        }
    }

    /// Adam with the usual (0.9, 0.999) betas
    pub fn adam() -> Self {
        OptimizerKind::Adam {
            beta1: 0.9,
            beta2: 0.999,
        }
    }

    pub fn build(&self, learning_rate: f64) -> Box<dyn Optimizer> {
        match *self {
            OptimizerKind::GradientDescent => Box::new(GradientDescent::new(learning_rate)),
            OptimizerKind::Momentum { momentum } => {
                Box::new(Momentum::new(learning_rate, momentum))
            }
            OptimizerKind::Adam { beta1, beta2 } => {
                Box::new(Adam::new(learning_rate).with_betas(beta1, beta2))
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            OptimizerKind::GradientDescent => "gd".to_string(),
            OptimizerKind::Momentum { momentum } => format!("momentum({})", momentum),
            OptimizerKind::Adam { .. } => "adam".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::NetworkShape;
    use approx::assert_relative_eq;

    fn ones_like(params: &Parameters) -> Gradients {
        let mut g = Gradients::zeros_like(params);
        g.w1.fill(1.0);
        g.b1.fill(1.0);
        g.w2.fill(1.0);
        g.b2.fill(1.0);
        g
    }

    #[test]
    fn test_gradient_descent_update() {
        let mut params = Parameters::zeros(NetworkShape::new(3, 2, 2));
        params.w1.fill(1.0);
        let grads = ones_like(&params);

        GradientDescent::new(0.01).update(&mut params, &grads).unwrap();

        assert_relative_eq!(params.w1[[0, 0]], 0.99, epsilon = 1e-12);
        assert_relative_eq!(params.b1[1], -0.01, epsilon = 1e-12);
        assert_relative_eq!(params.w2[[1, 1]], -0.01, epsilon = 1e-12);
        assert_relative_eq!(params.b2[0], -0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_non_positive_learning_rate_rejected() {
        let mut params = Parameters::zeros(NetworkShape::new(3, 2, 2));
        let grads = ones_like(&params);
        for lr in [0.0, -0.1, f64::NAN] {
            let result = GradientDescent::new(lr).update(&mut params, &grads);
            assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_mismatched_gradients_rejected() {
        let mut params = Parameters::zeros(NetworkShape::new(3, 2, 2));
        let other = Parameters::zeros(NetworkShape::new(3, 4, 2));
        let grads = ones_like(&other);
        let result = GradientDescent::new(0.1).update(&mut params, &grads);
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_momentum_accumulates_velocity() {
        let mut params = Parameters::zeros(NetworkShape::new(1, 1, 1));
        let grads = ones_like(&params);
        let mut optimizer = Momentum::new(0.1, 0.9);

        optimizer.update(&mut params, &grads).unwrap();
        assert_relative_eq!(params.w1[[0, 0]], -0.1, epsilon = 1e-12);

        // v = 0.9 * -0.1 - 0.1 = -0.19
        optimizer.update(&mut params, &grads).unwrap();
        assert_relative_eq!(params.w1[[0, 0]], -0.29, epsilon = 1e-12);

        optimizer.reset();
        optimizer.update(&mut params, &grads).unwrap();
        assert_relative_eq!(params.w1[[0, 0]], -0.39, epsilon = 1e-12);
    }

    #[test]
    fn test_adam_first_step_moves_by_learning_rate() {
        let mut params = Parameters::zeros(NetworkShape::new(2, 2, 2));
        let grads = ones_like(&params);
        let mut optimizer = Adam::new(0.001);

        optimizer.update(&mut params, &grads).unwrap();

        // After bias correction m_hat = g and v_hat = g^2, so the step is ~lr
        assert_relative_eq!(params.w1[[0, 0]], -0.001, epsilon = 1e-9);
    }

    #[test]
    fn test_adam_update_decreases_weights() {
        let mut params = Parameters::zeros(NetworkShape::new(3, 2, 2));
        params.w1.fill(1.0);
        let grads = ones_like(&params);
        let mut optimizer = Adam::new(0.001);

        for _ in 0..10 {
            optimizer.update(&mut params, &grads).unwrap();
        }

        assert!(params.w1[[0, 0]] < 1.0);
    }

    #[test]
    fn test_kind_validation_and_build() {
        assert!(OptimizerKind::Momentum { momentum: 1.5 }.validate().is_err());
        assert!(OptimizerKind::adam().validate().is_ok());

        let optimizer = OptimizerKind::adam().build(0.01);
        assert_eq!(optimizer.name(), "adam");
        assert_relative_eq!(optimizer.learning_rate(), 0.01);
        assert_eq!(OptimizerKind::default().build(0.1).name(), "gradient_descent");
    }
}
