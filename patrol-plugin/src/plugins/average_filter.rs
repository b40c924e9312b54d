//! The `average` filter: a fixed-size ring buffer of the last `window`
//! samples, exposing their mean.

use crate::error::PluginError;
use crate::filter::{Filter, FilterRegistry};
use crate::value::{get_float_or, get_int_or, Params};

const DEFAULT_WINDOW: usize = 10;

struct AverageFilter {
    init: f64,
    values: Vec<f64>,
    index: usize,
}

impl Filter for AverageFilter {
    fn init(&mut self) {
        for v in self.values.iter_mut() {
            *v = self.init;
        }
        self.index = 0;
    }

    fn put(&mut self, value: f64) -> f64 {
        self.values[self.index] = value;
        self.index = (self.index + 1) % self.values.len();

        let sum: f64 = self.values.iter().sum();
        sum / self.values.len() as f64
    }

    fn describe(&self) -> String {
        format!(
            "filter:average(window={}, init={})",
            self.values.len(),
            self.init
        )
    }
}

fn construct(params: &Params) -> Result<Box<dyn Filter>, PluginError> {
    let init = get_float_or("init", params, 0.0)?;
    let window = get_int_or("window", params, DEFAULT_WINDOW as i64)?;
    if window < 1 {
        return Err(PluginError::Other(format!(
            "too small window size: {window}"
        )));
    }

    let mut filter = AverageFilter {
        init,
        values: vec![0.0; window as usize],
        index: 0,
    };
    filter.init();
    Ok(Box::new(filter))
}

pub fn register(registry: &FilterRegistry) {
    registry.register("average", construct);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_ten() {
        let mut f = construct(&Params::new()).unwrap();
        // one sample of 1.0, nine of 0.0 -> each put returns 0.1 until the
        // 1.0 rolls out of the window on the tenth sample.
        let mut outputs = Vec::new();
        outputs.push(f.put(1.0));
        for _ in 0..9 {
            outputs.push(f.put(0.0));
        }
        assert_eq!(
            outputs,
            vec![0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.0]
        );
    }

    #[test]
    fn custom_window_and_init() {
        let mut params = Params::new();
        params.insert("window".into(), crate::value::Value::Int(2));
        params.insert("init".into(), crate::value::Value::Float(5.0));
        let mut f = construct(&params).unwrap();
        // init seeds both slots with 5.0
        assert_eq!(f.put(5.0), 5.0);
        assert_eq!(f.put(5.0), 5.0);
        assert_eq!(f.put(1.0), 3.0);
    }

    #[test]
    fn rejects_zero_window() {
        let mut params = Params::new();
        params.insert("window".into(), crate::value::Value::Int(0));
        assert!(construct(&params).is_err());
    }

    #[test]
    fn reinit_resets_buffer() {
        let mut f = construct(&Params::new()).unwrap();
        f.put(1.0);
        f.init();
        // after re-init every slot is back to `init` (0.0 by default)
        assert_eq!(f.put(0.0), 0.0);
    }
}
