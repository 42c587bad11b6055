//! Audio Device Enumeration and Lookup

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Type of audio device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    /// Microphone
    Input,
    /// Headphones or speakers
    Output,
}

/// A microphone or monitor output the booth could use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Human-readable device name, also used to select it
    pub name: String,

    pub device_type: DeviceType,

    /// Whether this is the system default device
    pub is_default: bool,

    /// Common sample rates the device supports (may be empty if querying failed)
    pub sample_rates: Vec<u32>,

    /// Whether the device can run a single channel natively
    pub supports_mono: bool,
}

impl AudioDevice {
    /// Enumerate all available audio devices on the default host
    pub fn enumerate_all() -> EngineResult<Vec<AudioDevice>> {
        let host = cpal::default_host();
        let mut devices = Vec::new();

        let default_input_name = host.default_input_device().and_then(|d| d.name().ok());
        let default_output_name = host.default_output_device().and_then(|d| d.name().ok());

        if let Ok(inputs) = host.input_devices() {
            for device in inputs {
                if let Ok(d) =
                    Self::from_cpal_device(&device, DeviceType::Input, default_input_name.as_deref())
                {
                    devices.push(d);
                }
            }
        }

        if let Ok(outputs) = host.output_devices() {
            for device in outputs {
                if let Ok(d) =
                    Self::from_cpal_device(&device, DeviceType::Output, default_output_name.as_deref())
                {
                    devices.push(d);
                }
            }
        }

        if devices.is_empty() {
            return Err(EngineError::NoDevicesFound);
        }

        Ok(devices)
    }

    /// Microphones only
    pub fn enumerate_inputs() -> EngineResult<Vec<AudioDevice>> {
        Ok(Self::enumerate_all()?
            .into_iter()
            .filter(|d| d.device_type == DeviceType::Input)
            .collect())
    }

    fn from_cpal_device(
        device: &cpal::Device,
        device_type: DeviceType,
        default_name: Option<&str>,
    ) -> EngineResult<Self> {
        let name = device
            .name()
            .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?;
        let is_default = default_name == Some(name.as_str());

        let (sample_rates, supports_mono) = match device_type {
            DeviceType::Input => device
                .supported_input_configs()
                .map(summarize_configs)
                .unwrap_or_default(),
            DeviceType::Output => device
                .supported_output_configs()
                .map(summarize_configs)
                .unwrap_or_default(),
        };

        Ok(AudioDevice {
            name,
            device_type,
            is_default,
            sample_rates,
            supports_mono,
        })
    }
}

/// Common rates listed for each device
const COMMON_RATES: [u32; 5] = [16000, 32000, 44100, 48000, 96000];

fn summarize_configs(
    configs: impl Iterator<Item = cpal::SupportedStreamConfigRange>,
) -> (Vec<u32>, bool) {
    let mut sample_rates = Vec::new();
    let mut supports_mono = false;

    for config in configs {
        supports_mono |= config.channels() == 1;
        let min = config.min_sample_rate().0;
        let max = config.max_sample_rate().0;
        for &rate in &COMMON_RATES {
            if rate >= min && rate <= max && !sample_rates.contains(&rate) {
                sample_rates.push(rate);
            }
        }
    }

    sample_rates.sort_unstable();
    (sample_rates, supports_mono)
}

/// Resolve the microphone: by name when given, else the host default
pub(crate) fn find_input(host: &cpal::Host, name: Option<&str>) -> EngineResult<cpal::Device> {
    match name {
        Some(wanted) => host
            .input_devices()
            .map_err(|e| EngineError::CaptureDevice(e.to_string()))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| EngineError::CaptureDevice(format!("no microphone named '{}'", wanted))),
        None => host
            .default_input_device()
            .ok_or_else(|| EngineError::CaptureDevice("no microphone available".into())),
    }
}

/// Resolve the monitor output: by name when given, else the host default
pub(crate) fn find_output(host: &cpal::Host, name: Option<&str>) -> EngineResult<cpal::Device> {
    match name {
        Some(wanted) => host
            .output_devices()
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| EngineError::DeviceNotFound(wanted.to_string())),
        None => host
            .default_output_device()
            .ok_or(EngineError::NoDevicesFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_serialization() {
        let input = DeviceType::Input;
        let json = serde_json::to_string(&input).unwrap();
        let deserialized: DeviceType = serde_json::from_str(&json).unwrap();
        assert_eq!(input, deserialized);
    }

    #[test]
    fn test_audio_device_serialization() {
        let device = AudioDevice {
            name: "USB Microphone".to_string(),
            device_type: DeviceType::Input,
            is_default: true,
            sample_rates: vec![44100, 48000],
            supports_mono: true,
        };

        let json = serde_json::to_string(&device).unwrap();
        let deserialized: AudioDevice = serde_json::from_str(&json).unwrap();

        assert_eq!(device.name, deserialized.name);
        assert_eq!(device.device_type, deserialized.device_type);
        assert!(deserialized.supports_mono);
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_enumerate_inputs() {
        let devices = AudioDevice::enumerate_inputs().unwrap();
        assert!(devices.iter().all(|d| d.device_type == DeviceType::Input));
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_missing_named_input_is_capture_failure() {
        let host = cpal::default_host();
        let err = find_input(&host, Some("definitely not a real microphone")).err().unwrap();
        assert!(err.is_capture_failure());
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_missing_named_output_is_capture_failure() {
        let host = cpal::default_host();
        let err = find_output(&host, Some("definitely not a real output")).err().unwrap();
        assert!(matches!(err, EngineError::DeviceNotFound(_)));
        assert!(err.into_start_failure().is_capture_failure());
    }
}
