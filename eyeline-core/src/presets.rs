//! Square output sizes commonly used for training crops.

/// A named output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPreset {
    /// Name accepted by `--preset`.
    pub name: &'static str,
    /// Side length of the square output in pixels.
    pub size: u32,
    pub description: &'static str,
}

impl OutputPreset {
    pub const fn new(name: &'static str, size: u32, description: &'static str) -> Self {
        Self {
            name,
            size,
            description,
        }
    }
}

static PRESETS: [OutputPreset; 5] = [
    OutputPreset::new("Thumbnail", 256, "Small square preview (256×256)"),
    OutputPreset::new("SD 1.5", 512, "Stable Diffusion 1.x training size (512×512)"),
    OutputPreset::new("SD 2", 768, "Stable Diffusion 2.x training size (768×768)"),
    OutputPreset::new("SDXL", 1024, "SDXL training size (1024×1024)"),
    OutputPreset::new("Flux", 1536, "High-resolution training size (1536×1536)"),
];

/// Returns the built-in presets, smallest first.
pub fn standard_presets() -> &'static [OutputPreset] {
    &PRESETS
}

/// Find a preset by name, ignoring case, spacing and punctuation.
pub fn preset_by_name(name: &str) -> Option<OutputPreset> {
    let key = normalize_name(name);
    standard_presets()
        .iter()
        .find(|preset| normalize_name(preset.name) == key)
        .copied()
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
