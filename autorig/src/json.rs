//! JSON descriptions of scenes and armatures, for tests, tooling and the
//! bundled example.
//!
//! The format mirrors the host document: objects carrying an armature (bones,
//! corrective drivers) or a mesh (shape keys, drivers). Angles are given in
//! degrees, as the host UI shows them.

use crate::drivers::{
    DataRef, Driver, DriverGraph, DriverType, DriverVariable, Easing, FCurve, HandleType, IdType,
    Interpolation, Keyframe, ShapeKeySet, TransformChannel, TransformSpace, VariableKind,
};
use crate::{
    Armature, Bone, Error, MeshObject, ObjectData, Scene, SceneConfig, SceneObject,
};
use glam::Vec3;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SceneDef {
    #[serde(default)]
    objects: Vec<ObjectDef>,
    #[serde(default)]
    active: Option<String>,
    #[serde(default)]
    selected: Vec<String>,
    #[serde(default)]
    config: ConfigDef,
}

#[derive(Debug, Deserialize)]
struct ConfigDef {
    #[serde(default = "default_true")]
    transfer_only_existing: bool,
}

impl Default for ConfigDef {
    fn default() -> Self {
        ConfigDef {
            transfer_only_existing: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ObjectDef {
    name: String,
    #[serde(rename = "type")]
    kind: ObjectKindDef,
    #[serde(default)]
    translation: [f32; 3],
    #[serde(default)]
    armature: Option<ArmatureDef>,
    #[serde(default)]
    shape_keys: Option<ShapeKeysDef>,
    #[serde(default)]
    rig: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ObjectKindDef {
    Rig,
    Mesh,
    Empty,
}

#[derive(Debug, Deserialize)]
struct ArmatureDef {
    name: String,
    #[serde(default)]
    bones: Vec<BoneDef>,
    #[serde(default)]
    drivers: Vec<CurveDef>,
}

#[derive(Debug, Deserialize)]
struct BoneDef {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    head: [f32; 3],
    tail: [f32; 3],
    #[serde(default)]
    roll: f32,
    #[serde(default = "default_true")]
    deform: bool,
    #[serde(default)]
    connected: bool,
    #[serde(default = "default_true", rename = "inheritRotation")]
    inherit_rotation: bool,
}

#[derive(Debug, Deserialize)]
struct ShapeKeysDef {
    name: String,
    #[serde(default, rename = "keyBlocks")]
    key_blocks: Vec<String>,
    #[serde(default)]
    drivers: Vec<CurveDef>,
}

#[derive(Debug, Deserialize)]
struct CurveDef {
    #[serde(rename = "dataPath")]
    data_path: String,
    #[serde(default)]
    expression: String,
    #[serde(default, rename = "type")]
    driver_type: Option<String>,
    #[serde(default)]
    variables: Vec<VariableDef>,
    #[serde(default)]
    keyframes: Vec<KeyframeDef>,
}

#[derive(Debug, Deserialize)]
struct KeyframeDef {
    co: [f32; 2],
    #[serde(default)]
    interpolation: Option<String>,
    #[serde(default)]
    easing: Option<String>,
    #[serde(default, rename = "handleLeft")]
    handle_left: Option<[f32; 2]>,
    #[serde(default, rename = "handleLeftType")]
    handle_left_type: Option<String>,
    #[serde(default, rename = "handleRight")]
    handle_right: Option<[f32; 2]>,
    #[serde(default, rename = "handleRightType")]
    handle_right_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VariableDef {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, rename = "idType")]
    id_type: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "dataPath")]
    data_path: Option<String>,
    #[serde(default)]
    object: Option<String>,
    #[serde(default, rename = "boneTarget")]
    bone_target: Option<String>,
    #[serde(default, rename = "transformSpace")]
    transform_space: Option<String>,
    #[serde(default, rename = "transformType")]
    transform_type: Option<String>,
}

impl Armature {
    /// Loads a bare armature description.
    pub fn from_json_str(input: &str) -> Result<Armature, Error> {
        let def: ArmatureDef = serde_json::from_str(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })?;
        resolve_armature(def)
    }
}

impl Scene {
    /// Loads a whole scene description.
    pub fn from_json_str(input: &str) -> Result<Scene, Error> {
        let def: SceneDef = serde_json::from_str(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })?;
        let mut scene = Scene {
            objects: Vec::with_capacity(def.objects.len()),
            active: def.active,
            selected: def.selected,
            config: SceneConfig {
                transfer_only_existing: def.config.transfer_only_existing,
            },
        };
        let rig_names: Vec<String> = def
            .objects
            .iter()
            .filter(|o| matches!(o.kind, ObjectKindDef::Rig))
            .map(|o| o.name.clone())
            .collect();
        for object in def.objects {
            let data = match object.kind {
                ObjectKindDef::Rig => {
                    let armature = object.armature.map(resolve_armature).transpose()?;
                    ObjectData::Rig(armature.unwrap_or_else(|| Armature::new(&object.name)))
                }
                ObjectKindDef::Mesh => {
                    if let Some(rig) = &object.rig {
                        if !rig_names.contains(rig) {
                            return Err(Error::JsonUnknownMeshRig {
                                mesh: object.name,
                                rig: rig.clone(),
                            });
                        }
                    }
                    ObjectData::Mesh(MeshObject {
                        shape_keys: object.shape_keys.map(resolve_shape_keys).transpose()?,
                        rig: object.rig,
                    })
                }
                ObjectKindDef::Empty => ObjectData::Empty,
            };
            scene.objects.push(SceneObject {
                name: object.name,
                translation: Vec3::from_array(object.translation),
                data,
            });
        }
        Ok(scene)
    }
}

fn resolve_armature(def: ArmatureDef) -> Result<Armature, Error> {
    let mut bones = Vec::with_capacity(def.bones.len());
    for bone_def in &def.bones {
        if let Some(parent) = &bone_def.parent {
            if !def.bones.iter().any(|b| &b.name == parent) {
                return Err(Error::JsonUnknownBoneParent {
                    bone: bone_def.name.clone(),
                    parent: parent.clone(),
                });
            }
        }
        let mut bone = Bone::new(
            &bone_def.name,
            Vec3::from_array(bone_def.head),
            Vec3::from_array(bone_def.tail),
        );
        bone.roll = bone_def.roll.to_radians();
        bone.parent = bone_def.parent.clone();
        bone.deform = bone_def.deform;
        bone.connected = bone_def.connected;
        bone.inherit_rotation = bone_def.inherit_rotation;
        bones.push(bone);
    }
    let mut armature = Armature::from_bones(&def.name, bones)?;
    armature.drivers = resolve_drivers(def.drivers)?;
    Ok(armature)
}

fn resolve_shape_keys(def: ShapeKeysDef) -> Result<ShapeKeySet, Error> {
    Ok(ShapeKeySet {
        name: def.name,
        key_blocks: def.key_blocks,
        drivers: resolve_drivers(def.drivers)?,
    })
}

fn resolve_drivers(defs: Vec<CurveDef>) -> Result<DriverGraph, Error> {
    let mut graph = DriverGraph::new();
    for def in defs {
        let driver_type = match def.driver_type.as_deref() {
            None => DriverType::Scripted,
            Some(value) => driver_type_from_json(value)?,
        };
        let mut variables = Vec::with_capacity(def.variables.len());
        for variable in def.variables {
            variables.push(resolve_variable(variable)?);
        }
        let mut keyframes = Vec::with_capacity(def.keyframes.len());
        for keyframe in def.keyframes {
            keyframes.push(resolve_keyframe(keyframe)?);
        }
        graph.push(FCurve {
            data_path: def.data_path,
            driver: Driver {
                driver_type,
                expression: def.expression,
                variables,
            },
            keyframes,
        })?;
    }
    Ok(graph)
}

fn resolve_variable(def: VariableDef) -> Result<DriverVariable, Error> {
    let kind = match def.kind.as_str() {
        "SINGLE_PROP" => VariableKind::SingleProp {
            id: DataRef {
                id_type: id_type_from_json(def.id_type.as_deref().unwrap_or("OBJECT"))?,
                name: def.id.unwrap_or_default(),
            },
            data_path: def.data_path.unwrap_or_default(),
        },
        "TRANSFORMS" => VariableKind::Transform {
            object: def.object.unwrap_or_default(),
            bone_target: def.bone_target.unwrap_or_default(),
            transform_space: transform_space_from_json(
                def.transform_space.as_deref().unwrap_or("LOCAL_SPACE"),
            )?,
            transform_type: transform_channel_from_json(
                def.transform_type.as_deref().unwrap_or("ROT_X"),
            )?,
        },
        other => {
            return Err(Error::JsonInvalidEnum {
                context: format!("variable type for '{}'", def.name),
                value: other.to_string(),
            });
        }
    };
    Ok(DriverVariable {
        name: def.name,
        kind,
    })
}

fn resolve_keyframe(def: KeyframeDef) -> Result<Keyframe, Error> {
    let mut keyframe = Keyframe::new(def.co[0], def.co[1]);
    if let Some(value) = def.interpolation.as_deref() {
        keyframe.interpolation = interpolation_from_json(value)?;
    }
    if let Some(value) = def.easing.as_deref() {
        keyframe.easing = easing_from_json(value)?;
    }
    if let Some(handle) = def.handle_left {
        keyframe.handle_left = handle;
    }
    if let Some(value) = def.handle_left_type.as_deref() {
        keyframe.handle_left_type = handle_type_from_json(value)?;
    }
    if let Some(handle) = def.handle_right {
        keyframe.handle_right = handle;
    }
    if let Some(value) = def.handle_right_type.as_deref() {
        keyframe.handle_right_type = handle_type_from_json(value)?;
    }
    Ok(keyframe)
}

fn invalid(context: &str, value: &str) -> Error {
    Error::JsonInvalidEnum {
        context: context.to_string(),
        value: value.to_string(),
    }
}

fn driver_type_from_json(value: &str) -> Result<DriverType, Error> {
    match value {
        "AVERAGE" => Ok(DriverType::Average),
        "SUM" => Ok(DriverType::Sum),
        "SCRIPTED" => Ok(DriverType::Scripted),
        "MIN" => Ok(DriverType::Min),
        "MAX" => Ok(DriverType::Max),
        _ => Err(invalid("driver type", value)),
    }
}

fn id_type_from_json(value: &str) -> Result<IdType, Error> {
    match value {
        "KEY" => Ok(IdType::Key),
        "ARMATURE" => Ok(IdType::Armature),
        "OBJECT" => Ok(IdType::Object),
        "SCENE" => Ok(IdType::Scene),
        "MATERIAL" => Ok(IdType::Material),
        _ => Err(invalid("id type", value)),
    }
}

fn transform_space_from_json(value: &str) -> Result<TransformSpace, Error> {
    match value {
        "WORLD_SPACE" => Ok(TransformSpace::World),
        "TRANSFORM_SPACE" => Ok(TransformSpace::Transform),
        "LOCAL_SPACE" => Ok(TransformSpace::Local),
        _ => Err(invalid("transform space", value)),
    }
}

fn transform_channel_from_json(value: &str) -> Result<TransformChannel, Error> {
    match value {
        "LOC_X" => Ok(TransformChannel::LocX),
        "LOC_Y" => Ok(TransformChannel::LocY),
        "LOC_Z" => Ok(TransformChannel::LocZ),
        "ROT_X" => Ok(TransformChannel::RotX),
        "ROT_Y" => Ok(TransformChannel::RotY),
        "ROT_Z" => Ok(TransformChannel::RotZ),
        "SCALE_X" => Ok(TransformChannel::ScaleX),
        "SCALE_Y" => Ok(TransformChannel::ScaleY),
        "SCALE_Z" => Ok(TransformChannel::ScaleZ),
        _ => Err(invalid("transform channel", value)),
    }
}

fn interpolation_from_json(value: &str) -> Result<Interpolation, Error> {
    match value {
        "CONSTANT" => Ok(Interpolation::Constant),
        "LINEAR" => Ok(Interpolation::Linear),
        "BEZIER" => Ok(Interpolation::Bezier),
        _ => Err(invalid("interpolation", value)),
    }
}

fn easing_from_json(value: &str) -> Result<Easing, Error> {
    match value {
        "AUTO" => Ok(Easing::Auto),
        "EASE_IN" => Ok(Easing::EaseIn),
        "EASE_OUT" => Ok(Easing::EaseOut),
        "EASE_IN_OUT" => Ok(Easing::EaseInOut),
        _ => Err(invalid("easing", value)),
    }
}

fn handle_type_from_json(value: &str) -> Result<HandleType, Error> {
    match value {
        "FREE" => Ok(HandleType::Free),
        "ALIGNED" => Ok(HandleType::Aligned),
        "VECTOR" => Ok(HandleType::Vector),
        "AUTO" => Ok(HandleType::Auto),
        "AUTO_CLAMPED" => Ok(HandleType::AutoClamped),
        _ => Err(invalid("handle type", value)),
    }
}
