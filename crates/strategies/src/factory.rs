use anyhow::Result;
use crate::{sma_crossover::SmaCrossover, SignalDetector};
use crate::types::SmaCrossoverSettings;
use core_types::DetectorConfig;

pub fn create_detector(config: &DetectorConfig) -> Result<Box<dyn SignalDetector + Send + Sync>> {
    let detector: Box<dyn SignalDetector + Send + Sync> = match config.name.as_str() {
        "sma_crossover" => {
            let settings: SmaCrossoverSettings = config.params.clone().try_into()?;
            Box::new(SmaCrossover::new(settings)?)
        }
        unknown => anyhow::bail!("Attempted to create unknown detector: {}", unknown),
    };

    Ok(detector)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, params: &str) -> DetectorConfig {
        DetectorConfig {
            name: name.to_string(),
            params: toml::from_str::<toml::Value>(params).unwrap(),
        }
    }

    #[test]
    fn builds_sma_crossover_from_params() {
        let detector = create_detector(&config("sma_crossover", "window = 20")).unwrap();
        assert_eq!(detector.name(), "SmaCrossover");
    }

    #[test]
    fn missing_window_falls_back_to_default() {
        assert!(create_detector(&config("sma_crossover", "")).is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(create_detector(&config("sma_crossover", "window = 0")).is_err());
    }

    #[test]
    fn unknown_detector_is_rejected() {
        let err = create_detector(&config("rsi", "")).err().unwrap();
        assert!(err.to_string().contains("unknown detector"));
    }
}
