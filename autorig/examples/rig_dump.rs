//! Loads a scene description, runs the rigging pipeline and dumps the
//! resulting bone/constraint inventory.
//!
//! Usage: `rig_dump [scene.json]` — without an argument a small built-in
//! humanoid is rigged.

use autorig::{Outcome, Scene, dispatch};
use serde_json::json;

fn demo_bone(name: &str, parent: Option<&str>, head: [f32; 3], tail: [f32; 3]) -> serde_json::Value {
    match parent {
        Some(parent) => json!({ "name": name, "parent": parent, "head": head, "tail": tail }),
        None => json!({ "name": name, "head": head, "tail": tail }),
    }
}

fn demo_scene() -> String {
    let mut bones = vec![demo_bone("hip", None, [0.0, 0.0, 1.0], [0.0, 0.0, 1.1])];
    for (sx, suffix) in [(1.0f32, ".L"), (-1.0f32, ".R")] {
        let collar = format!("Collar{suffix}");
        bones.push(demo_bone(&collar, Some("hip"), [sx * 0.05, 0.0, 1.45], [sx * 0.15, 0.0, 1.45]));
        let mut parent = collar;
        let mut x = 0.15;
        for name in ["ShldrBend", "ShldrTwist", "ForearmBend", "ForearmTwist"] {
            let bone = format!("{name}{suffix}");
            bones.push(demo_bone(&bone, Some(parent.as_str()), [sx * x, 0.0, 1.45], [sx * (x + 0.15), 0.0, 1.45]));
            parent = bone;
            x += 0.15;
        }
        bones.push(demo_bone(&format!("Hand{suffix}"), Some(parent.as_str()), [sx * x, 0.0, 1.45], [sx * (x + 0.08), 0.0, 1.45]));

        let mut parent = "hip".to_string();
        for (name, top) in [("ThighBend", 1.0f32), ("ThighTwist", 0.7), ("Shin", 0.4)] {
            let bone = format!("{name}{suffix}");
            bones.push(demo_bone(&bone, Some(parent.as_str()), [sx * 0.1, 0.0, top], [sx * 0.1, 0.0, top - 0.3]));
            parent = bone;
        }
        bones.push(demo_bone(&format!("Foot{suffix}"), Some(parent.as_str()), [sx * 0.1, 0.0, 0.1], [sx * 0.1, 0.1, 0.05]));
        bones.push(demo_bone(&format!("Metatarsals{suffix}"), Some(format!("Foot{suffix}").as_str()), [sx * 0.1, 0.1, 0.05], [sx * 0.1, 0.17, 0.02]));
        bones.push(demo_bone(&format!("Toe{suffix}"), Some(format!("Metatarsals{suffix}").as_str()), [sx * 0.1, 0.17, 0.02], [sx * 0.1, 0.22, 0.02]));
    }
    json!({
        "active": "Figure",
        "selected": ["Figure"],
        "objects": [
            { "name": "Figure", "type": "rig", "armature": { "name": "Demo", "bones": bones } }
        ]
    })
    .to_string()
}

fn main() {
    let input = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).expect("read scene json"),
        None => demo_scene(),
    };
    let mut scene = Scene::from_json_str(&input).expect("parse scene");

    for command in [
        "create_bone_groups",
        "add_root_bone",
        "rig_arm",
        "rig_leg",
        "add_foot_rocker",
        "fix_hand_driver",
        "fix_foot_driver",
        "fix_shldr_driver",
    ] {
        match dispatch(command, &mut scene).expect(command) {
            Outcome::Finished => println!("{command}: finished"),
            Outcome::Cancelled => println!("{command}: cancelled"),
        }
    }

    let armature = scene
        .active_object()
        .and_then(|o| o.armature())
        .expect("active rig");
    println!("\n{} bones:", armature.len());
    for bone in armature.bones() {
        let parent = bone.parent.as_deref().unwrap_or("-");
        let group = bone.group.as_deref().unwrap_or("-");
        println!("  {:<28} parent={parent:<22} group={group}", bone.name);
        for constraint in &bone.constraints {
            let target = constraint.bone_target().unwrap_or("-");
            println!("      [{}] -> {target}", constraint.name);
        }
    }
}
