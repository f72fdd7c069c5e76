//! Built-in presets
//!
//! The custom-chain presets are recipe tables. A new variant is a new table,
//! not a new code path in the chain builder.

use crate::preset::{BellBand, ParametricChain, Preset, RecipeStep, ShelfBand};
use crate::stage::{CompressorSettings, FilterStage, LimiterSettings, ShelfKind};

/// Id of the catalog's fallback preset
pub const DEFAULT_PRESET_ID: &str = "balanced";

const fn shelf(freq_hz: f64, gain_db: f64) -> ShelfBand {
    ShelfBand { freq_hz, gain_db }
}

const fn bell(freq_hz: f64, gain_db: f64, q: f64) -> BellBand {
    BellBand { freq_hz, gain_db, q }
}

const fn compressor(
    threshold_db: f64,
    ratio: f64,
    attack_ms: f64,
    release_ms: f64,
) -> CompressorSettings {
    CompressorSettings {
        threshold_db,
        ratio,
        attack_ms,
        release_ms,
    }
}

const fn limiter(ceiling_db: f64, attack_ms: f64, release_ms: f64) -> LimiterSettings {
    LimiterSettings {
        ceiling_db,
        attack_ms,
        release_ms,
    }
}

// ============================================================================
// Custom recipes
// ============================================================================

const RUMBLE_CUT: RecipeStep = RecipeStep::Stage(FilterStage::HighPass { freq_hz: 30.0 });

const BOX_CUT: RecipeStep = RecipeStep::Stage(FilterStage::Bell {
    freq_hz: 350.0,
    gain_db: -2.0,
    q: 1.2,
});

const HARSHNESS_CUT: RecipeStep = RecipeStep::Stage(FilterStage::Bell {
    freq_hz: 3500.0,
    gain_db: -1.5,
    q: 2.0,
});

/// Narrow cut on the vocal presence band
const PRESENCE_CUT: RecipeStep = RecipeStep::Stage(FilterStage::Bell {
    freq_hz: 5200.0,
    gain_db: -2.5,
    q: 4.0,
});

const AIR_TAME: RecipeStep = RecipeStep::Stage(FilterStage::Shelf {
    kind: ShelfKind::High,
    freq_hz: 12000.0,
    gain_db: -1.5,
});

const TRANSIENT_COMPRESSOR: RecipeStep =
    RecipeStep::Stage(FilterStage::Compressor(compressor(-18.0, 3.0, 3.0, 60.0)));

const LOW_END_SHELF: RecipeStep = RecipeStep::Stage(FilterStage::Shelf {
    kind: ShelfKind::Low,
    freq_hz: 120.0,
    gain_db: -1.0,
});

const LOW_END_COMPRESSOR: RecipeStep =
    RecipeStep::Stage(FilterStage::Compressor(compressor(-22.0, 2.5, 30.0, 250.0)));

const GLUE_COMPRESSOR: RecipeStep =
    RecipeStep::Stage(FilterStage::Compressor(compressor(-14.0, 1.5, 30.0, 600.0)));

const FINAL_LIMITER: RecipeStep = RecipeStep::Limiter {
    attack_ms: 5.0,
    release_ms: 50.0,
};

pub const STUDIO_RECIPE: &[RecipeStep] = &[
    RUMBLE_CUT,
    BOX_CUT,
    HARSHNESS_CUT,
    AIR_TAME,
    TRANSIENT_COMPRESSOR,
    LOW_END_SHELF,
    LOW_END_COMPRESSOR,
    GLUE_COMPRESSOR,
    RecipeStep::Gain,
    FINAL_LIMITER,
];

pub const STUDIO_VOCAL_RECIPE: &[RecipeStep] = &[
    RUMBLE_CUT,
    BOX_CUT,
    HARSHNESS_CUT,
    PRESENCE_CUT,
    AIR_TAME,
    TRANSIENT_COMPRESSOR,
    LOW_END_SHELF,
    LOW_END_COMPRESSOR,
    GLUE_COMPRESSOR,
    RecipeStep::Gain,
    FINAL_LIMITER,
];

/// All built-in presets, default first
pub fn presets() -> Vec<Preset> {
    vec![
        Preset::parametric(
            DEFAULT_PRESET_ID,
            "Neutral tone, streaming loudness",
            -14.0,
            -1.0,
            ParametricChain {
                bass: shelf(100.0, 0.0),
                mid: bell(1000.0, 0.0, 1.0),
                high: shelf(10000.0, 0.0),
                compressor: compressor(-18.0, 2.0, 20.0, 250.0),
                limiter: limiter(-1.0, 5.0, 50.0),
            },
        ),
        Preset::parametric(
            "warm",
            "Fuller low end, softened top",
            -14.0,
            -1.0,
            ParametricChain {
                bass: shelf(120.0, 2.0),
                mid: bell(2500.0, -1.0, 1.2),
                high: shelf(9000.0, -1.0),
                compressor: compressor(-20.0, 2.5, 15.0, 200.0),
                limiter: limiter(-1.0, 5.0, 50.0),
            },
        ),
        Preset::parametric(
            "bright",
            "Lifted presence and air",
            -14.0,
            -1.0,
            ParametricChain {
                bass: shelf(100.0, 0.0),
                mid: bell(3000.0, 1.0, 1.0),
                high: shelf(10000.0, 2.5),
                compressor: compressor(-18.0, 2.0, 20.0, 250.0),
                limiter: limiter(-1.0, 5.0, 50.0),
            },
        ),
        Preset::parametric(
            "punchy",
            "Forward low end and mids, tighter dynamics",
            -11.0,
            -1.0,
            ParametricChain {
                bass: shelf(80.0, 3.0),
                mid: bell(1500.0, 1.5, 0.9),
                high: shelf(10000.0, 1.0),
                compressor: compressor(-16.0, 3.0, 10.0, 150.0),
                limiter: limiter(-0.8, 3.0, 40.0),
            },
        ),
        Preset::parametric(
            "loud",
            "Competitive loudness for club and radio",
            -9.0,
            -1.0,
            ParametricChain {
                bass: shelf(90.0, 1.5),
                mid: bell(1000.0, 0.0, 1.0),
                high: shelf(11000.0, 1.5),
                compressor: compressor(-14.0, 2.0, 10.0, 120.0),
                limiter: limiter(-0.5, 3.0, 40.0),
            },
        ),
        Preset::parametric(
            "podcast",
            "Spoken word, intelligibility first",
            -16.0,
            -1.5,
            ParametricChain {
                bass: shelf(100.0, -2.0),
                mid: bell(3000.0, 1.5, 1.4),
                high: shelf(10000.0, 0.0),
                compressor: compressor(-22.0, 3.0, 5.0, 120.0),
                limiter: limiter(-1.5, 5.0, 60.0),
            },
        ),
        Preset::custom(
            "studio",
            "Corrective EQ with multi-stage dynamics",
            -10.0,
            -1.0,
            STUDIO_RECIPE,
        ),
        Preset::custom(
            "studio-vocal",
            "Studio chain with vocal presence control",
            -10.0,
            -1.0,
            STUDIO_VOCAL_RECIPE,
        ),
    ]
}
