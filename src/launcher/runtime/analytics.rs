//! Aim UI anonymous usage analytics: the opt-out decision and the one-time notice.

const ALERT_MSG: &str = "Aim UI collects anonymous usage analytics.";
const OPT_OUT_MSG: &str = "Read how to opt-out here: ";
const OPT_OUT_URL: &str = "https://github.com/aimhubio/aim#anonymized-telemetry";
const BOX_MARGIN: usize = 16;

/// Value of `AIM_UI_TELEMETRY_ENABLED` handed to the UI server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryFlag {
    Enabled,
    Disabled,
}

impl TelemetryFlag {
    pub const fn env_value(&self) -> &'static str {
        match self {
            TelemetryFlag::Enabled => "1",
            TelemetryFlag::Disabled => "0",
        }
    }

    pub const fn is_enabled(&self) -> bool {
        matches!(self, TelemetryFlag::Enabled)
    }
}

/// Dev mode always disables analytics; otherwise only an existing value of exactly `"0"` opts out.
pub fn resolve_telemetry(dev: bool, opt_out: Option<&str>) -> TelemetryFlag {
    if dev || opt_out == Some("0") {
        TelemetryFlag::Disabled
    } else {
        TelemetryFlag::Enabled
    }
}

/// Lines of the boxed notice printed when analytics are enabled.
pub fn telemetry_notice_lines() -> Vec<String> {
    let line_width = ALERT_MSG.chars().count().max(OPT_OUT_MSG.chars().count()) + BOX_MARGIN;
    let rule = "-".repeat(line_width - 2);

    let mut lines = Vec::with_capacity(5);
    lines.push(format!("┌{rule}┐"));
    for message in [ALERT_MSG, OPT_OUT_MSG, OPT_OUT_URL] {
        lines.push(centered(message, line_width));
    }
    lines.push(format!("└{rule}┘"));
    lines
}

fn centered(message: &str, width: usize) -> String {
    let pad = " ".repeat(width.saturating_sub(message.chars().count()) / 2);
    format!("{pad}{message}{pad}")
}
