use crate::commands::DashboardMetrics;
use crate::models::{ContentItem, ContentStatus, ContentType, SettingsRecord};
use chrono::DateTime;
use std::fmt::Write;
use std::str::FromStr;

// Static analytics shown on the dashboard
const WEEKLY_TRAFFIC: [(&str, u32, u32); 7] = [
    ("Mon", 4000, 2400),
    ("Tue", 3000, 1398),
    ("Wed", 2000, 9800),
    ("Thu", 2780, 3908),
    ("Fri", 1890, 4800),
    ("Sat", 2390, 3800),
    ("Sun", 3490, 4300),
];
const ENGAGEMENT: [(&str, u32); 4] = [("LinkClick", 65), ("Share", 45), ("Like", 85), ("Save", 35)];

pub struct PricingTier {
    pub title: &'static str,
    pub price: &'static str,
    pub recommended: bool,
    pub features: &'static [&'static str],
}

pub const PRICING_TIERS: [PricingTier; 3] = [
    PricingTier {
        title: "Operative",
        price: "$29",
        recommended: false,
        features: &[
            "Basic Trend Analysis",
            "10 Content Generations/day",
            "Standard Support",
            "Single User Seat",
        ],
    },
    PricingTier {
        title: "Tactical",
        price: "$99",
        recommended: true,
        features: &[
            "Advanced Neural Models",
            "Unlimited Generation",
            "API Access",
            "Priority Support",
            "5 User Seats",
            "Custom Templates",
        ],
    },
    PricingTier {
        title: "Strategic",
        price: "$299",
        recommended: false,
        features: &[
            "Full Source Code Access",
            "White-label Options",
            "Dedicated Server",
            "24/7 Ops Support",
            "Unlimited Seats",
            "Custom Model Fine-tuning",
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum View {
    #[default]
    Dashboard,
    Generator,
    Monetization,
    Settings,
}

impl View {
    pub const ALL: [View; 4] = [View::Dashboard, View::Generator, View::Monetization, View::Settings];

    /// Menu label shown in the sidebar.
    pub fn label(&self) -> &'static str {
        match self {
            View::Dashboard => "Command Center",
            View::Generator => "Neural Forge",
            View::Monetization => "Revenue Streams",
            View::Settings => "System Config",
        }
    }
}

impl FromStr for View {
    type Err = String;

    /// Accepts the menu number (1-4), the screen name, or its label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<usize>() {
            return View::ALL
                .get(n.wrapping_sub(1))
                .copied()
                .ok_or_else(|| format!("No menu entry {}", n));
        }
        View::ALL
            .into_iter()
            .find(|v| {
                format!("{:?}", v).eq_ignore_ascii_case(s) || v.label().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| format!("Unknown screen '{}'", s))
    }
}

/// Session state: the active screen and the generator pane. Starts on the dashboard.
#[derive(Debug, Default)]
pub struct Shell {
    current: View,
    output: Option<String>,
    last_request: Option<(ContentType, String)>,
}

impl Shell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn select(&mut self, view: View) {
        log::debug!("Switching view {:?} -> {:?}", self.current, view);
        self.current = view;
    }

    /// Text in the generator output pane.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Type and topic of the last generation or restored item; a bare `gen` repeats it.
    pub fn last_request(&self) -> Option<(ContentType, &str)> {
        self.last_request
            .as_ref()
            .map(|(content_type, topic)| (*content_type, topic.as_str()))
    }

    pub fn record_generation(&mut self, content_type: ContentType, topic: &str, text: &str) {
        self.last_request = Some((content_type, topic.to_string()));
        self.output = Some(text.to_string());
        self.select(View::Generator);
    }

    /// Loads an archived item back into the generator, including its topic and type.
    pub fn restore(&mut self, item: &ContentItem) {
        self.record_generation(item.content_type, &item.topic, &item.body);
    }

    /// Back to the initial screen with an empty generator, as after a purge.
    pub fn reset(&mut self) {
        self.current = View::Dashboard;
        self.output = None;
        self.last_request = None;
    }
}

pub fn render_menu(active: View) -> String {
    let mut out = String::new();
    for (i, view) in View::ALL.iter().enumerate() {
        let marker = if *view == active { ">" } else { " " };
        let _ = writeln!(out, "{} {}. {}", marker, i + 1, view.label());
    }
    out
}

fn format_date(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn bar(value: u32, unit: u32) -> String {
    "#".repeat((value / unit.max(1)) as usize)
}

pub fn render_dashboard(metrics: &DashboardMetrics, insight: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Command Center ==");
    let _ = writeln!(out, "Content Generated : {}", metrics.content_generated);
    let _ = writeln!(out, "Active Users      : 1");
    let _ = writeln!(out, "Efficiency Rate   : 98.2%");
    let _ = writeln!(out, "Est. Value Saved  : ${}", metrics.est_value_saved);
    let _ = writeln!(
        out,
        "Last Active       : {}",
        metrics.last_active.map(format_date).unwrap_or_else(|| "N/A".to_string())
    );

    let _ = writeln!(out, "\n-- Revenue vs organic (weekly) --");
    for (day, revenue, organic) in WEEKLY_TRAFFIC {
        let _ = writeln!(out, "{:<4} ${:<5} {}", day, revenue, bar(revenue, 500));
        let _ = writeln!(out, "{:<4} org {:<5} {}", "", organic, bar(organic, 500));
    }

    let _ = writeln!(out, "\n-- Engagement --");
    for (name, value) in ENGAGEMENT {
        let _ = writeln!(out, "{:<10} {:>3}% {}", name, value, bar(value, 5));
    }

    let _ = writeln!(out, "\n-- AI Insight --\n{}", insight);
    out
}

pub fn render_generator(output: Option<&str>, history: &[ContentItem]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Neural Forge ==");
    let types: Vec<&str> = ContentType::ALL.iter().map(ContentType::as_str).collect();
    let _ = writeln!(out, "Platforms: {}", types.join(" | "));
    let _ = writeln!(out, "\n-- Output --");
    let _ = writeln!(out, "{}", output.unwrap_or("AWAITING INPUT PARAMETERS"));

    let _ = writeln!(out, "\n-- Archives ({}) --", history.len());
    if history.is_empty() {
        let _ = writeln!(out, "No archived generations found.");
    }
    for item in history {
        let flag = match item.status {
            ContentStatus::Generated => "",
            ContentStatus::Failed => " [failed]",
        };
        let _ = writeln!(
            out,
            "{} {:<8} {}{}  ({})",
            format_date(item.timestamp),
            item.content_type,
            item.title,
            flag,
            item.id
        );
    }
    out
}

pub fn render_monetization() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Revenue Streams ==");
    for tier in &PRICING_TIERS {
        let badge = if tier.recommended { "  [RECOMMENDED]" } else { "" };
        let _ = writeln!(out, "\n{} {}/mo{}", tier.title, tier.price, badge);
        for feature in tier.features {
            let _ = writeln!(out, "  - {}", feature);
        }
    }
    out
}

// Keys shorter than this are masked completely
const MIN_MASKED_TAIL_LEN: usize = 12;

fn mask_key(key: &str) -> String {
    let len = key.chars().count();
    if len < MIN_MASKED_TAIL_LEN {
        return "****".to_string();
    }
    let tail: String = key.chars().skip(len - 4).collect();
    format!("****{}", tail)
}

pub fn render_settings(settings: &SettingsRecord) -> String {
    let on_off = |flag: bool| if flag { "on" } else { "off" };
    let mut out = String::new();
    let _ = writeln!(out, "== System Config ==");
    let _ = writeln!(out, "Username            : {}", settings.username);
    let _ = writeln!(out, "Role                : {}", settings.role);
    let _ = writeln!(out, "Email reports       : {}", on_off(settings.email_notifications));
    let _ = writeln!(out, "Auto-archive        : {}", on_off(settings.auto_save));
    let _ = writeln!(
        out,
        "API key             : {}",
        settings
            .configured_api_key()
            .map(mask_key)
            .unwrap_or_else(|| "not configured".to_string())
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_starts_on_dashboard_and_switches() {
        let mut shell = Shell::new();
        assert_eq!(shell.current(), View::Dashboard);
        shell.select(View::Settings);
        assert_eq!(shell.current(), View::Settings);
        shell.reset();
        assert_eq!(shell.current(), View::Dashboard);
    }

    #[test]
    fn restore_brings_back_topic_type_and_body() {
        let mut shell = Shell::new();
        assert!(shell.last_request().is_none());

        let item = ContentItem::new("launch week", ContentType::Email, "Dear all".to_string(), ContentStatus::Generated);
        shell.restore(&item);

        assert_eq!(shell.current(), View::Generator);
        assert_eq!(shell.output(), Some("Dear all"));
        assert_eq!(shell.last_request(), Some((ContentType::Email, "launch week")));

        shell.record_generation(ContentType::Blog, "pricing", "Post");
        assert_eq!(shell.last_request(), Some((ContentType::Blog, "pricing")));

        shell.reset();
        assert!(shell.output().is_none());
        assert!(shell.last_request().is_none());
    }

    #[test]
    fn view_parses_numbers_names_and_labels() {
        assert_eq!("2".parse::<View>().unwrap(), View::Generator);
        assert_eq!("monetization".parse::<View>().unwrap(), View::Monetization);
        assert_eq!("system config".parse::<View>().unwrap(), View::Settings);
        assert!("0".parse::<View>().is_err());
        assert!("5".parse::<View>().is_err());
        assert!("reports".parse::<View>().is_err());
    }

    #[test]
    fn menu_marks_active_entry() {
        let menu = render_menu(View::Generator);
        assert!(menu.contains("> 2. Neural Forge"));
        assert!(menu.contains("  1. Command Center"));
    }

    #[test]
    fn dashboard_shows_metrics_and_insight() {
        let metrics = DashboardMetrics {
            content_generated: 3,
            last_active: Some(0),
            est_value_saved: 75,
        };
        let screen = render_dashboard(&metrics, "Organic is up.");
        assert!(screen.contains("Content Generated : 3"));
        assert!(screen.contains("Est. Value Saved  : $75"));
        assert!(screen.contains("Last Active       : 1970-01-01"));
        assert!(screen.contains("Organic is up."));
    }

    #[test]
    fn settings_screen_masks_key() {
        let settings = SettingsRecord {
            api_key: Some("sk-abcdef1234".to_string()),
            ..SettingsRecord::default()
        };
        let screen = render_settings(&settings);
        assert!(screen.contains("****1234"));
        assert!(!screen.contains("abcdef"));
    }

    #[test]
    fn short_keys_are_fully_masked() {
        for key in ["abcd", "k", "short-key1"] {
            let settings = SettingsRecord {
                api_key: Some(key.to_string()),
                ..SettingsRecord::default()
            };
            let screen = render_settings(&settings);
            assert!(screen.contains("API key             : ****\n"));
            assert!(!screen.contains(key));
        }
    }

    #[test]
    fn monetization_lists_three_tiers() {
        let screen = render_monetization();
        assert!(screen.contains("Operative $29/mo"));
        assert!(screen.contains("Tactical $99/mo  [RECOMMENDED]"));
        assert!(screen.contains("Strategic $299/mo"));
    }

    #[test]
    fn generator_placeholder_when_empty() {
        let screen = render_generator(None, &[]);
        assert!(screen.contains("AWAITING INPUT PARAMETERS"));
        assert!(screen.contains("No archived generations found."));
    }
}
