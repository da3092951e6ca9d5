//! Recurrent network: a single LSTM layer over a scalar input series, with a
//! linear head mapping the final hidden state to the next value.
//!
//! Training is plain SGD on MSE with backpropagation through time, stopping
//! early when the epoch loss plateaus (best weights restored).

use ndarray::{Array1, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Hyperparameters of the sequence network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkSettings {
    pub hidden: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    /// Epochs without loss improvement before training stops.
    pub patience: usize,
    pub seed: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            hidden: 64,
            epochs: 100,
            learning_rate: 0.05,
            patience: 3,
            seed: 7,
        }
    }
}

/// LSTM cell weights for a scalar input.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LstmCell {
    hidden: usize,
    // input gate
    w_ii: Array1<f64>,
    w_hi: Array2<f64>,
    b_i: Array1<f64>,
    // forget gate
    w_if: Array1<f64>,
    w_hf: Array2<f64>,
    b_f: Array1<f64>,
    // cell candidate
    w_ig: Array1<f64>,
    w_hg: Array2<f64>,
    b_g: Array1<f64>,
    // output gate
    w_io: Array1<f64>,
    w_ho: Array2<f64>,
    b_o: Array1<f64>,
}

/// Per-step activations kept for backpropagation through time.
struct StepCache {
    x: f64,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    tanh_c: Array1<f64>,
}

fn sigmoid(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

impl LstmCell {
    fn new(hidden: usize, rng: &mut StdRng) -> Self {
        let limit = (1.0 / hidden as f64).sqrt();
        let dist = Uniform::new(-limit, limit);
        Self {
            hidden,
            w_ii: Array1::random_using(hidden, dist, rng),
            w_hi: Array2::random_using((hidden, hidden), dist, rng),
            b_i: Array1::zeros(hidden),
            w_if: Array1::random_using(hidden, dist, rng),
            w_hf: Array2::random_using((hidden, hidden), dist, rng),
            // Forget bias starts at 1 so early training retains state.
            b_f: Array1::from_elem(hidden, 1.0),
            w_ig: Array1::random_using(hidden, dist, rng),
            w_hg: Array2::random_using((hidden, hidden), dist, rng),
            b_g: Array1::zeros(hidden),
            w_io: Array1::random_using(hidden, dist, rng),
            w_ho: Array2::random_using((hidden, hidden), dist, rng),
            b_o: Array1::zeros(hidden),
        }
    }

    fn step(&self, x: f64, h_prev: &Array1<f64>, c_prev: &Array1<f64>) -> StepCache {
        let i = sigmoid(&(&self.w_ii * x + self.w_hi.dot(h_prev) + &self.b_i));
        let f = sigmoid(&(&self.w_if * x + self.w_hf.dot(h_prev) + &self.b_f));
        let g = (&self.w_ig * x + self.w_hg.dot(h_prev) + &self.b_g).mapv(f64::tanh);
        let o = sigmoid(&(&self.w_io * x + self.w_ho.dot(h_prev) + &self.b_o));
        let c = &f * c_prev + &i * &g;
        let tanh_c = c.mapv(f64::tanh);
        StepCache {
            x,
            h_prev: h_prev.clone(),
            c_prev: c_prev.clone(),
            i,
            f,
            g,
            o,
            tanh_c,
        }
    }
}

/// The trainable network: one LSTM cell plus a linear output head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceNetwork {
    cell: LstmCell,
    w_out: Array1<f64>,
    b_out: f64,
    #[serde(skip)]
    pub loss_history: Vec<f64>,
}

const GRAD_CLIP: f64 = 5.0;
const LOSS_IMPROVEMENT: f64 = 1e-9;

impl SequenceNetwork {
    pub fn new(settings: &NetworkSettings) -> Self {
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let limit = (1.0 / settings.hidden as f64).sqrt();
        let dist = Uniform::new(-limit, limit);
        Self {
            cell: LstmCell::new(settings.hidden, &mut rng),
            w_out: Array1::random_using(settings.hidden, dist, &mut rng),
            b_out: 0.0,
            loss_history: Vec::new(),
        }
    }

    pub fn hidden(&self) -> usize {
        self.cell.hidden
    }

    /// Forward pass over one window; returns the next-value estimate.
    pub fn forward(&self, window: &[f64]) -> f64 {
        let mut h = Array1::zeros(self.cell.hidden);
        let mut c = Array1::zeros(self.cell.hidden);
        for &x in window {
            let cache = self.cell.step(x, &h, &c);
            c = &cache.f * &cache.c_prev + &cache.i * &cache.g;
            h = &cache.o * &cache.tanh_c;
        }
        self.w_out.dot(&h) + self.b_out
    }

    /// Train on (window, next value) pairs. Returns the final epoch loss.
    pub fn train(&mut self, windows: &[Vec<f64>], targets: &[f64], settings: &NetworkSettings) -> f64 {
        assert_eq!(windows.len(), targets.len(), "window/target count mismatch");
        assert!(!windows.is_empty(), "training set must not be empty");

        self.loss_history.clear();
        let mut best_loss = f64::INFINITY;
        let mut best_weights: Option<(LstmCell, Array1<f64>, f64)> = None;
        let mut wait = 0usize;

        for _ in 0..settings.epochs {
            let mut epoch_loss = 0.0;
            for (window, &target) in windows.iter().zip(targets) {
                epoch_loss += self.sgd_step(window, target, settings.learning_rate);
            }
            epoch_loss /= windows.len() as f64;
            self.loss_history.push(epoch_loss);

            if epoch_loss + LOSS_IMPROVEMENT < best_loss {
                best_loss = epoch_loss;
                best_weights = Some((self.cell.clone(), self.w_out.clone(), self.b_out));
                wait = 0;
            } else {
                wait += 1;
                if wait >= settings.patience {
                    break;
                }
            }
        }

        if let Some((cell, w_out, b_out)) = best_weights {
            self.cell = cell;
            self.w_out = w_out;
            self.b_out = b_out;
        }
        best_loss
    }

    /// One forward/backward pass plus an SGD update. Returns the sample loss.
    fn sgd_step(&mut self, window: &[f64], target: f64, lr: f64) -> f64 {
        let hidden = self.cell.hidden;
        let mut h = Array1::zeros(hidden);
        let mut c = Array1::zeros(hidden);
        let mut caches = Vec::with_capacity(window.len());
        for &x in window {
            let cache = self.cell.step(x, &h, &c);
            c = &cache.f * &cache.c_prev + &cache.i * &cache.g;
            h = &cache.o * &cache.tanh_c;
            caches.push(cache);
        }
        let y = self.w_out.dot(&h) + self.b_out;
        let err = y - target;
        let loss = 0.5 * err * err;

        // Head gradients.
        let clip = |v: f64| v.clamp(-GRAD_CLIP, GRAD_CLIP);
        let d_w_out = (&h * err).mapv(clip);
        let d_b_out = clip(err);
        let mut dh = &self.w_out * err;
        let mut dc_next: Array1<f64> = Array1::zeros(hidden);

        // Accumulated cell gradients.
        let mut g_w_ii = Array1::<f64>::zeros(hidden);
        let mut g_w_hi = Array2::<f64>::zeros((hidden, hidden));
        let mut g_b_i = Array1::<f64>::zeros(hidden);
        let mut g_w_if = Array1::<f64>::zeros(hidden);
        let mut g_w_hf = Array2::<f64>::zeros((hidden, hidden));
        let mut g_b_f = Array1::<f64>::zeros(hidden);
        let mut g_w_ig = Array1::<f64>::zeros(hidden);
        let mut g_w_hg = Array2::<f64>::zeros((hidden, hidden));
        let mut g_b_g = Array1::<f64>::zeros(hidden);
        let mut g_w_io = Array1::<f64>::zeros(hidden);
        let mut g_w_ho = Array2::<f64>::zeros((hidden, hidden));
        let mut g_b_o = Array1::<f64>::zeros(hidden);

        for cache in caches.iter().rev() {
            let dc = &dh * &cache.o * cache.tanh_c.mapv(|t| 1.0 - t * t) + &dc_next;
            let d_o = &dh * &cache.tanh_c;
            let d_i = &dc * &cache.g;
            let d_g = &dc * &cache.i;
            let d_f = &dc * &cache.c_prev;
            dc_next = &dc * &cache.f;

            let di_p = (&d_i * &cache.i * cache.i.mapv(|v| 1.0 - v)).mapv(clip);
            let df_p = (&d_f * &cache.f * cache.f.mapv(|v| 1.0 - v)).mapv(clip);
            let dg_p = (&d_g * cache.g.mapv(|v| 1.0 - v * v)).mapv(clip);
            let do_p = (&d_o * &cache.o * cache.o.mapv(|v| 1.0 - v)).mapv(clip);

            g_w_ii += &(&di_p * cache.x);
            g_w_if += &(&df_p * cache.x);
            g_w_ig += &(&dg_p * cache.x);
            g_w_io += &(&do_p * cache.x);
            g_b_i += &di_p;
            g_b_f += &df_p;
            g_b_g += &dg_p;
            g_b_o += &do_p;

            let h_row = cache.h_prev.view().insert_axis(Axis(0));
            g_w_hi += &di_p.view().insert_axis(Axis(1)).dot(&h_row);
            g_w_hf += &df_p.view().insert_axis(Axis(1)).dot(&h_row);
            g_w_hg += &dg_p.view().insert_axis(Axis(1)).dot(&h_row);
            g_w_ho += &do_p.view().insert_axis(Axis(1)).dot(&h_row);

            dh = self.cell.w_hi.t().dot(&di_p)
                + self.cell.w_hf.t().dot(&df_p)
                + self.cell.w_hg.t().dot(&dg_p)
                + self.cell.w_ho.t().dot(&do_p);
        }

        // SGD update.
        self.w_out -= &(d_w_out * lr);
        self.b_out -= d_b_out * lr;
        self.cell.w_ii -= &(g_w_ii * lr);
        self.cell.w_hi -= &(g_w_hi * lr);
        self.cell.b_i -= &(g_b_i * lr);
        self.cell.w_if -= &(g_w_if * lr);
        self.cell.w_hf -= &(g_w_hf * lr);
        self.cell.b_f -= &(g_b_f * lr);
        self.cell.w_ig -= &(g_w_ig * lr);
        self.cell.w_hg -= &(g_w_hg * lr);
        self.cell.b_g -= &(g_b_g * lr);
        self.cell.w_io -= &(g_w_io * lr);
        self.cell.w_ho -= &(g_w_ho * lr);
        self.cell.b_o -= &(g_b_o * lr);

        loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_settings() -> NetworkSettings {
        NetworkSettings {
            hidden: 8,
            epochs: 15,
            learning_rate: 0.05,
            patience: 3,
            seed: 7,
        }
    }

    fn training_pairs(series: &[f64], window: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut windows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..series.len() - window {
            windows.push(series[i..i + window].to_vec());
            targets.push(series[i + window]);
        }
        (windows, targets)
    }

    #[test]
    fn forward_is_deterministic_for_a_seed() {
        let settings = small_settings();
        let a = SequenceNetwork::new(&settings);
        let b = SequenceNetwork::new(&settings);
        let window = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(a.forward(&window), b.forward(&window));
    }

    #[test]
    fn training_reduces_loss() {
        let series: Vec<f64> = (0..40).map(|i| 0.5 + (i as f64 * 0.5).sin() * 0.3).collect();
        let (windows, targets) = training_pairs(&series, 6);
        let settings = small_settings();
        let mut net = SequenceNetwork::new(&settings);
        net.train(&windows, &targets, &settings);
        assert!(net.loss_history.len() >= 2);
        let first = net.loss_history[0];
        let best = net
            .loss_history
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        assert!(best <= first, "loss never improved: {first} -> {best}");
    }

    #[test]
    fn early_stop_respects_patience() {
        let series: Vec<f64> = (0..30).map(|i| 0.5 + (i as f64 * 0.5).sin() * 0.3).collect();
        let (windows, targets) = training_pairs(&series, 5);
        let settings = NetworkSettings {
            epochs: 200,
            ..small_settings()
        };
        let mut net = SequenceNetwork::new(&settings);
        net.train(&windows, &targets, &settings);
        assert!(net.loss_history.len() <= settings.epochs);
    }

    #[test]
    fn serialization_round_trip_preserves_output() {
        let settings = small_settings();
        let net = SequenceNetwork::new(&settings);
        let json = serde_json::to_string(&net).unwrap();
        let deser: SequenceNetwork = serde_json::from_str(&json).unwrap();
        let window = [0.2, 0.4, 0.6];
        assert_eq!(net.forward(&window), deser.forward(&window));
    }

    #[test]
    #[should_panic(expected = "window/target count mismatch")]
    fn train_rejects_mismatched_pairs() {
        let settings = small_settings();
        let mut net = SequenceNetwork::new(&settings);
        net.train(&[vec![0.1, 0.2]], &[0.3, 0.4], &settings);
    }
}
