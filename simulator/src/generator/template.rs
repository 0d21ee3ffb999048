use serde::{Deserialize, Serialize};
use tcascore::math::Vec3;

/// Canned encounter geometries relative to an ownship flying east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    #[default]
    HeadOn,
    Overtaking,
    Crossing,
    Diverging,
    MultiThreat,
}

/// Initial truth state of one synthetic intruder.
#[derive(Debug, Clone, PartialEq)]
pub struct IntruderTemplate {
    /// `None` for non-cooperative traffic seen only by radar and camera.
    pub icao: Option<u32>,
    pub callsign: Option<String>,
    /// Offset from the ownship start position.
    pub offset: Vec3,
    pub velocity: Vec3,
    pub visual: bool,
}

impl IntruderTemplate {
    fn cooperative(icao: u32, callsign: &str, offset: Vec3, velocity: Vec3) -> Self {
        Self {
            icao: Some(icao),
            callsign: Some(callsign.to_string()),
            offset,
            velocity,
            visual: false,
        }
    }
}

pub fn intruders(kind: ScenarioKind, own_speed: f64) -> Vec<IntruderTemplate> {
    let head_on = IntruderTemplate::cooperative(
        0xA1B2C3,
        "DAL212",
        Vec3::new(9260.0, 0.0, 0.0),
        Vec3::new(-own_speed, 0.0, 0.0),
    );
    // Meets ownship's track at the same instant from the south.
    let crossing = IntruderTemplate::cooperative(
        0x4CA7F1,
        "EIN41K",
        Vec3::new(6000.0, -6000.0, 100.0),
        Vec3::new(0.0, own_speed, 0.0),
    );

    match kind {
        ScenarioKind::HeadOn => vec![head_on],
        ScenarioKind::Overtaking => vec![IntruderTemplate::cooperative(
            0x3C6DD2,
            "DLH4TC",
            Vec3::new(1500.0, 0.0, 0.0),
            Vec3::new(own_speed * 0.6, 0.0, 0.0),
        )],
        ScenarioKind::Crossing => vec![crossing],
        ScenarioKind::Diverging => vec![IntruderTemplate::cooperative(
            0x89E112,
            "CPA903",
            Vec3::new(-2000.0, 500.0, 0.0),
            Vec3::new(-own_speed, 40.0, 0.0),
        )],
        ScenarioKind::MultiThreat => vec![
            head_on,
            crossing,
            IntruderTemplate {
                icao: None,
                callsign: None,
                offset: Vec3::new(4000.0, 3000.0, 300.0),
                velocity: Vec3::new(-100.0, -80.0, -5.0),
                visual: true,
            },
        ],
    }
}
