//! Fixed processing policies sent with every engine request.
//!
//! None of these are derived from job input. A stage always runs with the
//! policy returned by `Default`.
//!
//! The mode enums list every mode the engine accepts, not only the ones
//! pixstack sends, so an engine host built on this crate can decode any
//! request it is handed.

use serde::{Deserialize, Serialize};

/// Which master corrections the calibration stage applies.
///
/// Bias frames are not part of this pipeline, so bias correction is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationPolicy {
    pub enable_dark: bool,
    pub enable_flat: bool,
    pub enable_bias: bool,
}

impl Default for CalibrationPolicy {
    fn default() -> Self {
        Self {
            enable_dark: true,
            enable_flat: true,
            enable_bias: false,
        }
    }
}

/// How accepted pixels are combined. pixstack sends `Average`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combination {
    #[default]
    Average,
    Median,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    None,
    Additive,
    #[default]
    AdditiveWithScaling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    None,
    SigmaClip,
    #[default]
    WinsorizedSigmaClip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionNormalization {
    None,
    #[default]
    Scale,
}

/// Combination and rejection settings for multi-frame integration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationPolicy {
    pub combination: Combination,
    pub normalization: Normalization,
    pub rejection: Rejection,
    pub rejection_normalization: RejectionNormalization,
    /// Low clipping threshold, in sigma units
    pub sigma_low: f32,
    /// High clipping threshold, in sigma units
    pub sigma_high: f32,
    pub evaluate_snr: bool,
    pub generate_integrated_image: bool,
    pub generate_64bit_result: bool,
    pub auto_memory_size: bool,
    pub interactive: bool,
}

impl Default for IntegrationPolicy {
    fn default() -> Self {
        Self {
            combination: Combination::Average,
            normalization: Normalization::AdditiveWithScaling,
            rejection: Rejection::WinsorizedSigmaClip,
            rejection_normalization: RejectionNormalization::Scale,
            sigma_low: 4.0,
            sigma_high: 3.0,
            evaluate_snr: false,
            generate_integrated_image: true,
            generate_64bit_result: true,
            auto_memory_size: true,
            interactive: false,
        }
    }
}

/// Options for writing the active result to disk.
///
/// Saving never prompts and never refuses to replace an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOptions {
    pub prompt_format_options: bool,
    pub warn_on_feature_loss: bool,
    pub strict: bool,
    pub overwrite_protection: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            prompt_format_options: false,
            warn_on_feature_loss: false,
            strict: false,
            overwrite_protection: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_policy_skips_bias() {
        let policy = CalibrationPolicy::default();
        assert!(policy.enable_dark);
        assert!(policy.enable_flat);
        assert!(!policy.enable_bias);
    }

    #[test]
    fn integration_policy_uses_winsorized_clip() {
        let policy = IntegrationPolicy::default();
        assert_eq!(policy.combination, Combination::Average);
        assert_eq!(policy.normalization, Normalization::AdditiveWithScaling);
        assert_eq!(policy.rejection, Rejection::WinsorizedSigmaClip);
        assert_eq!(policy.rejection_normalization, RejectionNormalization::Scale);
        assert_eq!(policy.sigma_low, 4.0);
        assert_eq!(policy.sigma_high, 3.0);
        assert!(!policy.evaluate_snr);
        assert!(policy.generate_64bit_result);
        assert!(!policy.interactive);
    }

    #[test]
    fn integration_policy_serializes_snake_case() {
        let json = serde_json::to_value(IntegrationPolicy::default()).unwrap();
        assert_eq!(json["rejection"], "winsorized_sigma_clip");
        assert_eq!(json["normalization"], "additive_with_scaling");
    }

    #[test]
    fn every_engine_mode_decodes() {
        let policy: IntegrationPolicy = serde_json::from_value(serde_json::json!({
            "combination": "median",
            "normalization": "additive",
            "rejection": "sigma_clip",
            "rejection_normalization": "none",
            "sigma_low": 2.5,
            "sigma_high": 2.5,
            "evaluate_snr": true,
            "generate_integrated_image": true,
            "generate_64bit_result": false,
            "auto_memory_size": true,
            "interactive": false,
        }))
        .unwrap();
        assert_eq!(policy.combination, Combination::Median);
        assert_eq!(policy.normalization, Normalization::Additive);
        assert_eq!(policy.rejection, Rejection::SigmaClip);
        assert_eq!(policy.rejection_normalization, RejectionNormalization::None);

        let none: Normalization = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(none, Normalization::None);
        let none: Rejection = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(none, Rejection::None);
        assert!(serde_json::from_str::<Rejection>("\"linear_fit\"").is_err());
    }

    #[test]
    fn save_options_never_protect_existing_files() {
        let options = SaveOptions::default();
        assert!(!options.overwrite_protection);
        assert!(!options.prompt_format_options);
        assert!(!options.strict);
    }
}
