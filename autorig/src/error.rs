use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown bone: {name}")]
    UnknownBone { name: String },

    #[error("a bone named '{name}' already exists")]
    DuplicateBone { name: String },

    #[error("bone '{bone}' has no parent")]
    MissingParent { bone: String },

    #[error("no constraint named '{name}' on bone '{bone}'")]
    UnknownConstraint { bone: String, name: String },

    #[error("unknown object: {name}")]
    UnknownObject { name: String },

    #[error("object '{name}' has no shape keys")]
    MissingShapeKeys { name: String },

    #[error("a driver curve already exists at '{path}'")]
    DuplicateDriverPath { path: String },

    #[error("unknown command: {name}")]
    UnknownCommand { name: String },

    #[cfg(feature = "json")]
    #[error("failed to parse rig JSON: {message}")]
    JsonParse { message: String },

    #[cfg(feature = "json")]
    #[error("unknown parent bone '{parent}' for bone '{bone}'")]
    JsonUnknownBoneParent { bone: String, parent: String },

    #[cfg(feature = "json")]
    #[error("invalid {context} value '{value}'")]
    JsonInvalidEnum { context: String, value: String },

    #[cfg(feature = "json")]
    #[error("unknown rig object '{rig}' referenced by mesh '{mesh}'")]
    JsonUnknownMeshRig { mesh: String, rig: String },
}
