use std::fmt;
use std::str::FromStr;

use typed_prefs::futures::executor::{block_on, block_on_stream};
use typed_prefs::{preferences, Completion, MemoryGateway, Observable, ParseAdapter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme `{other}`")),
        }
    }
}

#[preferences(name = "app-preferences")]
#[adapter(Theme => ParseAdapter)]
pub trait AppPreferences {
    #[default(name = "notifications")]
    const NOTIFICATIONS_ENABLED: bool = true;
    #[default]
    const DEFAULT_USERNAME: &'static str = "guest";
    #[default]
    const DEFAULT_THEME: Theme = Theme::Light;
    #[default]
    const DEFAULT_FONT_SIZE: i32 = 14;

    #[get(name = "notifications")]
    fn notifications_enabled(&self) -> bool;
    #[get]
    fn get_username(&self) -> String;
    #[set_sync]
    fn set_username_sync(&self, value: &str) -> Completion;
    #[get]
    fn get_theme(&self) -> Theme;
    #[observe]
    fn observe_theme(&self) -> Observable<Theme>;
    #[set]
    fn set_theme(&self, value: Theme);
    #[get]
    fn get_font_size(&self) -> i32;
    #[set]
    fn set_font_size(&self, value: i32);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let gateway = MemoryGateway::from_toml(
        r#"
        [values]
        username = { string = "guest" }
        "#,
    )?;
    let prefs = AppPreferencesImpl::new(gateway.clone());

    println!("Current preferences:");
    println!("  Notifications: {}", prefs.notifications_enabled());
    println!("  Username: {}", prefs.get_username());
    println!("  Theme: {}", prefs.get_theme());
    println!("  Font size: {}", prefs.get_font_size());

    // Wait until the username is stored
    block_on(prefs.set_username_sync("Alice"))?;

    // Watch the theme while changing it
    let mut themes = block_on_stream(prefs.observe_theme());
    println!("\nTheme is {:?}", themes.next());
    prefs.set_theme(Theme::Dark);
    println!("Theme changed to {:?}", themes.next());
    drop(themes);

    prefs.set_font_size(16);

    println!("\nUpdated preferences:");
    println!("  Username: {}", prefs.get_username());
    println!("  Theme: {}", prefs.get_theme());
    println!("  Font size: {}", prefs.get_font_size());

    println!("\nStored snapshot:\n{}", gateway.to_toml()?);
    Ok(())
}
