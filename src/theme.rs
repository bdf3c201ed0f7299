//! Seasonal theming for the display shell.
//!
//! A theme is selected exactly once at startup. The shell slots the markup
//! fragments into its placeholder elements and animates the decorations;
//! nothing here touches the screen.

use rand::Rng;

/// Markup fragments for the shell's placeholder slots
#[derive(Debug, Clone, Default)]
pub struct ThemeMarkup {
    pub sidebar_header: String,
    pub main_header: String,
    pub welcome_screen: Option<String>,
    pub loading_indicator: Option<String>,
}

/// One floating decoration and its animation parameters
#[derive(Debug, Clone)]
pub struct Decoration {
    pub glyph: &'static str,
    /// Horizontal position in vw
    pub left: f32,
    /// Fall duration in seconds
    pub duration: f32,
    /// Start delay in seconds
    pub delay: f32,
    pub opacity: f32,
    /// Font size in em
    pub size: f32,
}

/// A seasonal look for the kiosk
pub trait Theme {
    fn name(&self) -> &'static str;

    fn markup(&self) -> ThemeMarkup;

    /// Ambient decorations the shell animates; empty for plain themes
    fn decorations(&self) -> Vec<Decoration> {
        Vec::new()
    }

    /// How long the welcome screen stays up before auto-hiding
    fn welcome_timeout_ms(&self) -> Option<u64> {
        None
    }
}

pub struct DefaultTheme;

impl Theme for DefaultTheme {
    fn name(&self) -> &'static str {
        "default"
    }

    fn markup(&self) -> ThemeMarkup {
        ThemeMarkup {
            sidebar_header: "<h2>Fotos</h2>".to_string(),
            main_header: "<h1>Selecione uma Foto</h1>".to_string(),
            welcome_screen: None,
            loading_indicator: Some(r#"<div class="loading">Carregando...</div>"#.to_string()),
        }
    }
}

const SNOWFLAKE_GLYPHS: [&str; 6] = ["\u{2744}\u{FE0F}", "\u{2745}", "\u{2746}", "\u{1F384}", "\u{1F381}", "\u{2B50}"];
const SNOWFLAKE_COUNT: usize = 30;

pub struct ChristmasTheme;

impl Theme for ChristmasTheme {
    fn name(&self) -> &'static str {
        "christmas"
    }

    fn markup(&self) -> ThemeMarkup {
        ThemeMarkup {
            sidebar_header: "<h2>\u{1F384} Fotos Mágicas \u{1F385}</h2>".to_string(),
            main_header: "<h1>Suas Lembranças de Natal</h1>".to_string(),
            welcome_screen: Some(
                r#"<div class="welcome-screen" id="welcome-screen">
    <div class="welcome-santa">🎅</div>
    <h1 class="welcome-title">Ho Ho Ho!</h1>
    <p>Clique para começar</p>
</div>"#
                    .to_string(),
            ),
            loading_indicator: Some(
                r#"<div class="loading-indicator" style="display: none;"><div class="spinner"></div></div>"#
                    .to_string(),
            ),
        }
    }

    fn decorations(&self) -> Vec<Decoration> {
        let mut rng = rand::rng();
        (0..SNOWFLAKE_COUNT)
            .map(|_| Decoration {
                glyph: SNOWFLAKE_GLYPHS[rng.random_range(0..SNOWFLAKE_GLYPHS.len())],
                left: rng.random_range(0.0..100.0),
                duration: rng.random_range(5.0..15.0),
                delay: rng.random_range(0.0..5.0),
                opacity: rng.random::<f32>(),
                size: rng.random_range(0.5..1.5),
            })
            .collect()
    }

    fn welcome_timeout_ms(&self) -> Option<u64> {
        Some(10_000)
    }
}

/// Resolve the configured theme, falling back to the default look
pub fn theme_for(name: &str) -> Box<dyn Theme> {
    match name {
        "christmas" => Box::new(ChristmasTheme),
        "default" => Box::new(DefaultTheme),
        other => {
            log::warn!("Unknown theme '{}', using default", other);
            Box::new(DefaultTheme)
        }
    }
}
