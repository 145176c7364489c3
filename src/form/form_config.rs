use serde::{Deserialize, Serialize};

/// Selectors, terminal phrases and timeouts that drive one application form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default = "default_container_selector")]
    pub container_selector: String,

    #[serde(default = "default_confirmation_selector")]
    pub confirmation_selector: String,

    /// Candidate list items that appear after typing into a combobox
    #[serde(default = "default_option_list_selector")]
    pub option_list_selector: String,

    #[serde(default = "default_apply_button_selector")]
    pub apply_button_selector: String,

    /// Header phrases (case-insensitive substring) that mean the form is done
    #[serde(default = "default_terminal_headers")]
    pub terminal_headers: Vec<String>,

    #[serde(default = "default_placeholder_option")]
    pub placeholder_option: String,

    /// Optional hard ceiling on steps per application; unbounded when absent
    #[serde(default)]
    pub max_steps: Option<u32>,

    #[serde(default)]
    pub timeouts: Timeouts,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            container_selector: default_container_selector(),
            confirmation_selector: default_confirmation_selector(),
            option_list_selector: default_option_list_selector(),
            apply_button_selector: default_apply_button_selector(),
            terminal_headers: default_terminal_headers(),
            placeholder_option: default_placeholder_option(),
            max_steps: None,
            timeouts: Timeouts::default(),
        }
    }
}

impl FormConfig {
    pub fn is_terminal_header(&self, header: &str) -> bool {
        let header = header.trim().to_lowercase();
        !header.is_empty()
            && self
                .terminal_headers
                .iter()
                .any(|t| header.contains(&t.to_lowercase()))
    }

    pub fn is_placeholder(&self, label: &str) -> bool {
        label.trim().eq_ignore_ascii_case(self.placeholder_option.trim())
    }
}

/// Fixed waits, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(default = "default_5000")]
    pub step_wait_ms: u64,
    #[serde(default = "default_2000")]
    pub click_ms: u64,
    #[serde(default = "default_5000")]
    pub confirm_wait_ms: u64,
    #[serde(default = "default_1000")]
    pub settle_ms: u64,
    #[serde(default = "default_2000")]
    pub pre_advance_ms: u64,
    #[serde(default = "default_2000")]
    pub combobox_populate_ms: u64,
    #[serde(default = "default_5000")]
    pub option_wait_ms: u64,
    #[serde(default = "default_10")]
    pub type_delay_ms: u64,
    #[serde(default = "default_50")]
    pub combobox_type_delay_ms: u64,
    #[serde(default = "default_200")]
    pub clear_pause_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            step_wait_ms: 5000,
            click_ms: 2000,
            confirm_wait_ms: 5000,
            settle_ms: 1000,
            pre_advance_ms: 2000,
            combobox_populate_ms: 2000,
            option_wait_ms: 5000,
            type_delay_ms: 10,
            combobox_type_delay_ms: 50,
            clear_pause_ms: 200,
        }
    }
}

// Serde default helpers
fn default_container_selector() -> String {
    r#"[class*="easy-apply-modal"], [class^="artdeco-modal"]"#.to_string()
}
fn default_confirmation_selector() -> String {
    r#"[role="alertdialog"], [class*="layer-confirmation"]"#.to_string()
}
fn default_option_list_selector() -> String {
    r#"[role="option"]"#.to_string()
}
fn default_apply_button_selector() -> String {
    r#"button[aria-label^="Easy Apply"]"#.to_string()
}
fn default_terminal_headers() -> Vec<String> {
    vec!["Application sent".to_string(), "Application submitted".to_string()]
}
fn default_placeholder_option() -> String { "Select an option".to_string() }
fn default_10() -> u64 { 10 }
fn default_50() -> u64 { 50 }
fn default_200() -> u64 { 200 }
fn default_1000() -> u64 { 1000 }
fn default_2000() -> u64 { 2000 }
fn default_5000() -> u64 { 5000 }
