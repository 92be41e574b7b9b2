use clap::ValueEnum;
use leaffall_core::Viewport;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
///
/// Every section has defaults, so an empty file (or no file) is a valid
/// configuration matching the stock autumn-leaves look.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub framerate: u32,
    /// Accessibility preference, read once at startup.
    pub reduced_motion: bool,
    pub viewport: Viewport,
    pub simulation: SimulationConfig,
    pub transport: TransportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            framerate: 60,
            reduced_motion: false,
            viewport: Viewport::default(),
            simulation: SimulationConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Simulation parameters with the reduced-motion preference applied.
    pub fn effective_simulation(&self) -> SimulationConfig {
        if self.reduced_motion {
            self.simulation.reduced_motion()
        } else {
            self.simulation.clone()
        }
    }
}

// --- Simulation ---

/// Everything the physics core reads. Immutable once the loop starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub population: PopulationParams,
    pub field: FieldParams,
    pub spawn: SpawnParams,
    pub pointer: PointerParams,
    pub clock: ClockParams,
    /// `#rrggbb` colours; leaves pick one at spawn.
    pub palette: Vec<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            population: PopulationParams::default(),
            field: FieldParams::default(),
            spawn: SpawnParams::default(),
            pointer: PointerParams::default(),
            clock: ClockParams::default(),
            palette: default_palette(),
        }
    }
}

pub const REDUCED_COUNT_FACTOR: f32 = 0.35;
pub const REDUCED_GRAVITY_FACTOR: f32 = 0.5;
pub const REDUCED_WIND_OSC_FACTOR: f32 = 0.4;
pub const REDUCED_MAX_SPEED_FACTOR: f32 = 0.6;

impl SimulationConfig {
    /// Fewer leaves and gentler physics; every formula stays the same.
    pub fn reduced_motion(&self) -> Self {
        let mut reduced = self.clone();
        reduced.population.base_count =
            (self.population.base_count as f32 * REDUCED_COUNT_FACTOR).round() as u32;
        reduced.field.gravity *= REDUCED_GRAVITY_FACTOR;
        reduced.field.wind_osc_amp *= REDUCED_WIND_OSC_FACTOR;
        reduced.field.max_speed *= REDUCED_MAX_SPEED_FACTOR;
        reduced
    }
}

/// Population sizing and leaf dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationParams {
    /// Leaf count at the reference resolution.
    pub base_count: u32,
    /// Floor so tiny viewports are never empty.
    pub min_count: u32,
    /// Ceiling so huge viewports cannot exhaust memory.
    pub max_count: u32,
    pub reference_width: f32,
    pub reference_height: f32,
    pub size_min: f32,
    pub size_max: f32,
}

impl Default for PopulationParams {
    fn default() -> Self {
        Self {
            base_count: 80,
            min_count: 12,
            max_count: 2000,
            reference_width: 1280.0,
            reference_height: 720.0,
            size_min: 8.0,
            size_max: 18.0,
        }
    }
}

impl PopulationParams {
    pub fn reference_area(&self) -> f32 {
        self.reference_width * self.reference_height
    }
}

/// Force field and integration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldParams {
    /// px/s^2 downward.
    pub gravity: f32,
    /// px/s baseline horizontal drift.
    pub wind_base: f32,
    pub wind_osc_amp: f32,
    /// Hz.
    pub wind_osc_freq: f32,
    /// Converts wind drift into horizontal acceleration.
    pub wind_to_accel: f32,
    /// Linear drag per second.
    pub drag_lin: f32,
    /// Angular damping per second.
    pub ang_drag: f32,
    /// px radius of pointer disturbance.
    pub impulse_radius: f32,
    pub impulse_strength: f32,
    /// Pointer speed above this adds no extra impulse.
    pub speed_cap: f32,
    pub speed_normalizer: f32,
    /// Tangential spin imparted by the pointer.
    pub swirl: f32,
    pub swirl_scale: f32,
    /// Random spin nudge at full falloff.
    pub spin_kick: f32,
    /// Hard clamp on velocity magnitude.
    pub max_speed: f32,
    /// px beyond the edges before wrapping or respawning.
    pub respawn_margin: f32,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            gravity: 22.0,
            wind_base: 10.0,
            wind_osc_amp: 25.0,
            wind_osc_freq: 0.07,
            wind_to_accel: 0.15,
            drag_lin: 0.06,
            ang_drag: 0.04,
            impulse_radius: 110.0,
            impulse_strength: 240.0,
            speed_cap: 1200.0,
            speed_normalizer: 600.0,
            swirl: 0.9,
            swirl_scale: 0.4,
            spin_kick: 0.6,
            max_speed: 360.0,
            respawn_margin: 24.0,
        }
    }
}

/// Random ranges for freshly spawned or respawned leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnParams {
    /// Horizontal velocity is drawn from `±drift_speed`.
    pub drift_speed: f32,
    pub fall_speed_min: f32,
    pub fall_speed_max: f32,
    /// Spin is drawn from `±spin` rad/s.
    pub spin: f32,
    pub wobble_rate_min: f32,
    pub wobble_rate_max: f32,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            drift_speed: 10.0,
            fall_speed_min: 10.0,
            fall_speed_max: 40.0,
            spin: 1.2,
            wobble_rate_min: 0.6,
            wobble_rate_max: 1.3,
        }
    }
}

/// Pointer tracking and decay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerParams {
    /// Seconds without a sample before speed starts decaying.
    pub idle_timeout: f64,
    /// Per-tick speed multiplier while idle.
    pub decay: f32,
    /// Below this speed (px/s) an idle pointer goes inactive.
    pub sleep_speed: f32,
    /// Floor on the time between samples when deriving velocity.
    pub min_interval: f64,
}

impl Default for PointerParams {
    fn default() -> Self {
        Self {
            idle_timeout: 0.16,
            decay: 0.9,
            sleep_speed: 5.0,
            min_interval: 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockParams {
    /// Longest step the integrator will take, in seconds.
    pub max_dt: f32,
    /// Step used when the elapsed time is unknown or not positive.
    pub fallback_dt: f32,
}

impl Default for ClockParams {
    fn default() -> Self {
        Self { max_dt: 0.033, fallback_dt: 0.016 }
    }
}

/// Muted autumn tones.
pub fn default_palette() -> Vec<String> {
    [
        "#c0392b", // maple red
        "#d35400", // burnt orange
        "#e67e22", // pumpkin
        "#f39c12", // amber
        "#a0522d", // sienna
        "#8b5a2b", // saddle brown
        "#b5651d", // rust
        "#aa7f39", // golden brown
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

/// An sRGB colour parsed from the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

// --- Transport ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SerializerType {
    Json,
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Stdio,
    Null,
    #[value(name = "websocket")]
    WebSocket,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub serializer: SerializerType,
    pub sender: SenderType,
    /// Send every Nth frame.
    pub frame_interval: u32,
    pub websocket: WebSocketOptions,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            serializer: SerializerType::Json,
            sender: SenderType::Null,
            frame_interval: 1,
            websocket: WebSocketOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketOptions {
    pub host: String,
    pub port: u16,
}

impl Default for WebSocketOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}
