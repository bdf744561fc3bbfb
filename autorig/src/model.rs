use glam::{Quat, Vec3};

/// Editing mode of an armature. Never ambient state: operations that need a
/// particular mode request the transition themselves, and [`crate::Armature::enter`]
/// returns the mode that was previously active.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Mode {
    #[default]
    Object,
    Edit,
    Pose,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum RotationMode {
    #[default]
    Quaternion,
    EulerXyz,
}

/// 32-slot bone visibility set.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);

    pub fn single(layer: u32) -> LayerMask {
        LayerMask(1 << layer)
    }

    pub fn contains(self, layer: u32) -> bool {
        self.0 & (1 << layer) != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::single(0)
    }
}

/// Host color themes used for bone groups.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ColorTheme {
    Theme01,
    Theme03,
    Theme04,
    Theme06,
    Theme09,
}

#[derive(Clone, Debug)]
pub struct BoneGroup {
    pub name: String,
    pub theme: ColorTheme,
}

/// Display widget assigned to a controller bone. Purely visual; the widget
/// meshes themselves belong to the host document.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WidgetShape {
    Circle,
    Cube,
    Sphere,
    Rhomboid,
    Pyramid,
    Chest,
    Clavicle,
    Torso,
    Plane,
    Root,
    FkLimb1,
    FkLimb2,
    Roll1,
    PaddleRounded,
}

/// Per-axis enable flags for rotation-style constraints.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Axes {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Axes {
    pub const ALL: Axes = Axes {
        x: true,
        y: true,
        z: true,
    };
    pub const X: Axes = Axes {
        x: true,
        y: false,
        z: false,
    };
    pub const Y: Axes = Axes {
        x: false,
        y: true,
        z: false,
    };
    pub const Z: Axes = Axes {
        x: false,
        y: false,
        z: true,
    };
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Space {
    World,
    Local,
    LocalWithParent,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MixMode {
    Replace,
    Add,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TrackAxis {
    X,
    Y,
    Z,
    NegX,
    NegY,
    NegZ,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LockAxis {
    X,
    Y,
    Z,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Axis {
    X,
    Y,
    Z,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MapTo {
    Location,
    Rotation,
    Scale,
}

/// What a constraint points at. Bone targets name a bone in the same
/// armature; object targets name a scene object (e.g. an empty).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstraintTarget {
    Bone(String),
    Object(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintKind {
    Ik {
        chain_count: u32,
        target: Option<ConstraintTarget>,
        pole_target: Option<ConstraintTarget>,
        pole_angle_deg: f32,
    },
    CopyRotation {
        target: ConstraintTarget,
        axes: Axes,
        mix: MixMode,
        target_space: Space,
        owner_space: Space,
    },
    LimitRotation {
        axes: Axes,
        min_deg: Vec3,
        max_deg: Vec3,
        affect_transform: bool,
        owner_space: Space,
    },
    LimitLocation {
        min: [Option<f32>; 3],
        max: [Option<f32>; 3],
        affect_transform: bool,
        owner_space: Space,
    },
    CopyTransforms {
        target: ConstraintTarget,
        influence: f32,
    },
    CopyLocation {
        target: ConstraintTarget,
    },
    DampedTrack {
        target: ConstraintTarget,
    },
    LockedTrack {
        target: ConstraintTarget,
        head_tail: f32,
        track_axis: TrackAxis,
        lock_axis: LockAxis,
    },
    Transformation {
        target: ConstraintTarget,
        map_to: MapTo,
        map_to_x_from: Axis,
        from_min_y: f32,
        to_min_x_deg: f32,
    },
}

impl ConstraintKind {
    /// Host-style display name; also the default constraint name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ConstraintKind::Ik { .. } => "IK",
            ConstraintKind::CopyRotation { .. } => "Copy Rotation",
            ConstraintKind::LimitRotation { .. } => "Limit Rotation",
            ConstraintKind::LimitLocation { .. } => "Limit Location",
            ConstraintKind::CopyTransforms { .. } => "Copy Transforms",
            ConstraintKind::CopyLocation { .. } => "Copy Location",
            ConstraintKind::DampedTrack { .. } => "Damped Track",
            ConstraintKind::LockedTrack { .. } => "Locked Track",
            ConstraintKind::Transformation { .. } => "Transformation",
        }
    }
}

/// A constraint owned by exactly one bone. Constraints evaluate in vector
/// order; some builders move a new constraint to index 0 on purpose.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn new(kind: ConstraintKind) -> Constraint {
        Constraint {
            name: kind.display_name().to_string(),
            kind,
        }
    }

    pub fn with_name(mut self, name: &str) -> Constraint {
        self.name = name.to_string();
        self
    }

    pub fn ik(
        chain_count: u32,
        target: &str,
        pole_target: Option<&str>,
        pole_angle_deg: f32,
    ) -> Constraint {
        Constraint::new(ConstraintKind::Ik {
            chain_count,
            target: Some(ConstraintTarget::Bone(target.to_string())),
            pole_target: pole_target.map(|p| ConstraintTarget::Bone(p.to_string())),
            pole_angle_deg,
        })
    }

    /// Copy Rotation with the rig's default spaces (additive, local-with-parent
    /// target read in local owner space).
    pub fn copy_rotation(target: &str, axes: Axes) -> Constraint {
        Constraint::copy_rotation_spaces(target, axes, MixMode::Add, Space::LocalWithParent, Space::Local)
    }

    pub fn copy_rotation_spaces(
        target: &str,
        axes: Axes,
        mix: MixMode,
        target_space: Space,
        owner_space: Space,
    ) -> Constraint {
        Constraint::new(ConstraintKind::CopyRotation {
            target: ConstraintTarget::Bone(target.to_string()),
            axes,
            mix,
            target_space,
            owner_space,
        })
    }

    pub fn limit_rotation(axes: Axes, min_deg: Vec3, max_deg: Vec3) -> Constraint {
        Constraint::new(ConstraintKind::LimitRotation {
            axes,
            min_deg,
            max_deg,
            affect_transform: true,
            owner_space: Space::Local,
        })
    }

    pub fn limit_location(min: [Option<f32>; 3], max: [Option<f32>; 3]) -> Constraint {
        Constraint::new(ConstraintKind::LimitLocation {
            min,
            max,
            affect_transform: true,
            owner_space: Space::Local,
        })
    }

    pub fn copy_transforms(target: &str, influence: f32) -> Constraint {
        Constraint::new(ConstraintKind::CopyTransforms {
            target: ConstraintTarget::Bone(target.to_string()),
            influence,
        })
    }

    pub fn copy_location_object(object: &str) -> Constraint {
        Constraint::new(ConstraintKind::CopyLocation {
            target: ConstraintTarget::Object(object.to_string()),
        })
    }

    pub fn damped_track(target: &str) -> Constraint {
        Constraint::new(ConstraintKind::DampedTrack {
            target: ConstraintTarget::Bone(target.to_string()),
        })
    }

    pub fn locked_track(
        target: &str,
        head_tail: f32,
        track_axis: TrackAxis,
        lock_axis: LockAxis,
    ) -> Constraint {
        Constraint::new(ConstraintKind::LockedTrack {
            target: ConstraintTarget::Bone(target.to_string()),
            head_tail,
            track_axis,
            lock_axis,
        })
    }

    /// Y-location of the target mapped onto the owner's X rotation.
    pub fn transformation(target: &str, from_min_y: f32, to_min_x_deg: f32) -> Constraint {
        Constraint::new(ConstraintKind::Transformation {
            target: ConstraintTarget::Bone(target.to_string()),
            map_to: MapTo::Rotation,
            map_to_x_from: Axis::Y,
            from_min_y,
            to_min_x_deg,
        })
    }

    /// The bone this constraint reads from, if it targets one.
    pub fn bone_target(&self) -> Option<&str> {
        let target = match &self.kind {
            ConstraintKind::Ik { target, .. } => target.as_ref(),
            ConstraintKind::CopyRotation { target, .. }
            | ConstraintKind::CopyTransforms { target, .. }
            | ConstraintKind::CopyLocation { target }
            | ConstraintKind::DampedTrack { target }
            | ConstraintKind::LockedTrack { target, .. }
            | ConstraintKind::Transformation { target, .. } => Some(target),
            ConstraintKind::LimitRotation { .. } | ConstraintKind::LimitLocation { .. } => None,
        };
        match target {
            Some(ConstraintTarget::Bone(name)) => Some(name.as_str()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Bone {
    pub name: String,
    pub head: Vec3,
    pub tail: Vec3,
    /// Twist around the head→tail axis, radians.
    pub roll: f32,
    /// Weak back-reference; the parent does not own the child.
    pub parent: Option<String>,
    pub deform: bool,
    pub connected: bool,
    pub inherit_rotation: bool,
    pub layers: LayerMask,
    pub lock_location: [bool; 3],
    pub lock_rotation: [bool; 3],
    pub lock_ik: [bool; 3],
    pub rotation_mode: RotationMode,
    pub custom_shape: Option<WidgetShape>,
    pub group: Option<String>,
    pub constraints: Vec<Constraint>,
}

impl Bone {
    pub fn new(name: &str, head: Vec3, tail: Vec3) -> Bone {
        Bone {
            name: name.to_string(),
            head,
            tail,
            roll: 0.0,
            parent: None,
            deform: true,
            connected: false,
            inherit_rotation: true,
            layers: LayerMask::default(),
            lock_location: [false; 3],
            lock_rotation: [false; 3],
            lock_ik: [false; 3],
            rotation_mode: RotationMode::Quaternion,
            custom_shape: None,
            group: None,
            constraints: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Bone {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn vector(&self) -> Vec3 {
        self.tail - self.head
    }

    pub fn length(&self) -> f32 {
        self.vector().length()
    }

    /// Scales the tail along the current direction so the bone has the given length.
    pub fn set_length(&mut self, length: f32) {
        let dir = self.vector().normalize_or(Vec3::Z);
        self.tail = self.head + dir * length;
    }

    /// Local basis: Y runs head→tail, X/Z follow from the minimal twist off +Y
    /// plus the bone's roll.
    pub fn axes(&self) -> [Vec3; 3] {
        let y = self.vector().normalize_or(Vec3::Y);
        let align = Quat::from_rotation_arc(Vec3::Y, y);
        let twist = Quat::from_axis_angle(y, self.roll);
        let rot = twist * align;
        [rot * Vec3::X, y, rot * Vec3::Z]
    }

    /// A local-space offset expressed in armature space.
    pub fn local_offset(&self, offset: Vec3) -> Vec3 {
        let [x, y, z] = self.axes();
        x * offset.x + y * offset.y + z * offset.z
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn constraint_mut(&mut self, name: &str) -> Option<&mut Constraint> {
        self.constraints.iter_mut().find(|c| c.name == name)
    }
}
