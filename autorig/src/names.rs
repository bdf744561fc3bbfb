//! The bone-naming convention the builders are written against.
//!
//! All derived names are pure string functions over the base skeleton's
//! DAZ-style bone tokens; nothing here touches an armature.

/// A body side and its name suffix. Paired operations iterate
/// [`Side::BOTH`] and must use the same side for a whole derivation chain.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn suffix(self) -> &'static str {
        match self {
            Side::Left => ".L",
            Side::Right => ".R",
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
        }
    }

    pub fn apply(self, base: &str) -> String {
        format!("{base}{}", self.suffix())
    }

    /// Inverse of [`Side::apply`] for this side's suffix.
    pub fn strip(self, name: &str) -> Option<&str> {
        name.strip_suffix(self.suffix())
    }
}

/// Mechanism-bone name: hidden, non-deforming constraint plumbing.
pub fn mch(base: &str) -> String {
    format!("{base}.MCH")
}

pub const ROOT: &str = "Root";
pub const HIP: &str = "hip";
pub const HAND: &str = "Hand";
pub const FOOT: &str = "Foot";
pub const METATARSALS: &str = "Metatarsals";
pub const TOE: &str = "Toe";
pub const COLLAR: &str = "Collar";
pub const PECTORAL: &str = "Pectoral";

pub const HAND_CTRL: &str = "Hand.controller";
pub const LEG_CTRL: &str = "Leg.controller";
pub const ARM_POLE: &str = "Arm.pole";
pub const LEG_POLE: &str = "Leg.pole";
pub const FINGER_CTRL: &str = "Finger.Ctrl";
pub const FOOT_ROCKER: &str = "Foot.Rocker";
pub const HAND_DRIVER: &str = "Hand.driver";
pub const FOOT_DRIVER: &str = "Foot.driver";
pub const SHLDR_DRIVER_X: &str = "Shldr.Drv.X";
pub const SHLDR_DRIVER_Z: &str = "Shldr.Drv.Z";

/// Shoulder→wrist, proximal to distal. The IK chain covers all four.
pub const ARM_BONES: [&str; 4] = ["ShldrBend", "ShldrTwist", "ForearmBend", "ForearmTwist"];
/// Hip→ankle; the IK chain covers all three.
pub const LEG_BONES: [&str; 3] = ["ThighBend", "ThighTwist", "Shin"];
pub const FINGERS: [&str; 5] = ["Thumb", "Index", "Mid", "Ring", "Pinky"];
pub const TOES: [&str; 5] = ["BigToe", "SmallToe1", "SmallToe2", "SmallToe3", "SmallToe4"];
pub const FOOT_BONES: [&str; 3] = [FOOT, METATARSALS, TOE];
pub const SPINE_BONES: [&str; 9] = [
    "hip",
    "pelvis",
    "abdomenLower",
    "abdomenUpper",
    "chestLower",
    "chestUpper",
    "neckLower",
    "neckUpper",
    "head",
];

/// Bone-group names used for color coding.
pub mod groups {
    pub const CONTROLLERS: &str = "Controllers";
    pub const POLES: &str = "Poles";
    pub const FK: &str = "Forward Kinematics";
    pub const SHAPEKEY_CONTROLLERS: &str = "Shapekey Controllers";
    pub const FK_WITHOUT_IK: &str = "Forward Kinematics (w/o IK)";
}

/// A corrective-driver identifier pattern, resolved per side and matched by
/// substring against driver data paths.
#[derive(Copy, Clone, Debug)]
pub enum DriverPattern {
    /// `<stem>_<L|R>(fin)`, the plain joint-corrective convention.
    SideLetter(&'static str),
    /// `<stem><n?><angle>(fin)` where the left side carries an `n` marker for
    /// the negative rotation direction.
    NegMarker(&'static str, u32),
}

impl DriverPattern {
    pub fn resolve(self, side: Side) -> String {
        match self {
            DriverPattern::SideLetter(stem) => format!("{stem}_{}(fin)", side.letter()),
            DriverPattern::NegMarker(stem, angle) => {
                let marker = match side {
                    Side::Left => "n",
                    Side::Right => "",
                };
                format!("{stem}{marker}{angle}(fin)")
            }
        }
    }
}

/// One corrective driver to rebind: its identifier pattern and, where the new
/// driver bone's range differs from the original joint's, the literal
/// replacement expression.
pub type Corrective = (DriverPattern, Option<&'static str>);

pub const HAND_CORRECTIVES: &[Corrective] = &[
    (DriverPattern::SideLetter("pJCMHandDwn_70"), None),
    (DriverPattern::SideLetter("pJCMHandUp_80"), None),
];

// The replacement coefficients compensate for the driver bone's range; they
// were tuned against the stock DAZ morphs and must be kept verbatim.
pub const FOOT_CORRECTIVES: &[Corrective] = &[
    (DriverPattern::SideLetter("pJCMFootDwn_75"), Some("-1.13*A")),
    (DriverPattern::SideLetter("pJCMHDFootUp_40"), Some("1.45*A")),
];

pub const SHLDR_X_CORRECTIVES: &[Corrective] = &[
    (DriverPattern::NegMarker("CTRLMD_N_YRotate_", 110), None),
    (DriverPattern::SideLetter("pJCMShldrFwd_110"), None),
];

pub const SHLDR_Z_CORRECTIVES: &[Corrective] = &[
    (DriverPattern::SideLetter("pJCMShldrDown_40"), None),
    (DriverPattern::SideLetter("pJCMShldrUp_90"), None),
    (DriverPattern::NegMarker("CTRLMD_N_ZRotate_", 40), None),
    (DriverPattern::NegMarker("CTRLMD_N_ZRotate_", 90), None),
];

pub const SHAPE_KEY_PATH_PREFIX: &str = "key_blocks[\"";
pub const SHAPE_KEY_PATH_SUFFIX: &str = "\"].value";

/// Data path of the driver F-curve animating the named shape key.
pub fn shape_key_data_path(name: &str) -> String {
    format!("{SHAPE_KEY_PATH_PREFIX}{name}{SHAPE_KEY_PATH_SUFFIX}")
}

/// The shape-key name a driver data path encodes, when it follows the
/// convention.
pub fn shape_key_from_data_path(path: &str) -> Option<&str> {
    path.strip_prefix(SHAPE_KEY_PATH_PREFIX)?
        .strip_suffix(SHAPE_KEY_PATH_SUFFIX)
}

/// `lCollar` → `Collar.L`, `rThigh` → `Thigh.R`. Returns `None` for names
/// that do not carry the DAZ side prefix.
pub fn daz_to_suffix(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let first = chars.next()?;
    let second = chars.next()?;
    if !second.is_uppercase() {
        return None;
    }
    let side = match first {
        'l' => Side::Left,
        'r' => Side::Right,
        _ => return None,
    };
    Some(side.apply(&name[1..]))
}

/// Inverse of [`daz_to_suffix`]: `Collar.L` → `lCollar`.
pub fn suffix_to_daz(name: &str) -> Option<String> {
    if let Some(base) = Side::Left.strip(name) {
        Some(format!("l{base}"))
    } else {
        Side::Right.strip(name).map(|base| format!("r{base}"))
    }
}
