use std::collections::HashMap;

use crate::core::scene::animation::{
    Animation, AnimationChannel, AnimationSampler, ChannelTransformation, NodeAnimationData,
    NodeAnimationDataType, SamplerInterpolation, Skin,
};
use crate::core::scene::{Scene, SceneNodeIdx};
use super::accessor::{AccessorData, FLOAT};
use super::decode::Err;
use super::document::{lookup, DocAnimation, GltfModel};

fn animation_data_type(ty: &str) -> Result<NodeAnimationDataType, Err> {
    match ty {
        "SCALAR" => Ok(NodeAnimationDataType::Scalar),
        "VEC3" => Ok(NodeAnimationDataType::Vec3),
        "VEC4" => Ok(NodeAnimationDataType::Vec4),
        "MAT4" => Ok(NodeAnimationDataType::Mat4),
        _ => Err(Err::UnsupportedType(format!("Unsupported animation data type '{}'.", ty))),
    }
}

/// Reads a float accessor as animation data. `expected` restricts the accessor type.
fn read_animation_data(
    model: &GltfModel,
    accessor_index: i64,
    expected: Option<NodeAnimationDataType>,
) -> Result<NodeAnimationData, Err> {
    let data = AccessorData::new(model, accessor_index)?;
    let ty = check_data_type(accessor_index, &data.accessor.ty, expected)?;
    if data.accessor.component_type != FLOAT {
        return Err(Err::TypeMismatch(format!(
            "Animation accessor {} must hold floats.", accessor_index
        )));
    }
    let values = data.read::<f32>(ty.num_components())?;
    Ok(NodeAnimationData::new(ty, data.accessor.normalized, values))
}

fn check_data_type(
    accessor_index: i64,
    accessor_type: &str,
    expected: Option<NodeAnimationDataType>,
) -> Result<NodeAnimationDataType, Err> {
    let ty = animation_data_type(accessor_type)?;
    if expected.is_some_and(|expected| expected != ty) {
        return Err(Err::TypeMismatch(format!(
            "Accessor {} has type '{}', expected {:?}.", accessor_index, accessor_type, expected
        )));
    }
    Ok(ty)
}

fn interpolation(value: Option<&str>) -> Result<SamplerInterpolation, Err> {
    match value {
        None | Some("LINEAR") => Ok(SamplerInterpolation::Linear),
        Some("STEP") => Ok(SamplerInterpolation::Step),
        Some("CUBICSPLINE") => Ok(SamplerInterpolation::CubicSpline),
        Some(other) => Err(Err::InvalidValue(format!("Invalid sampler interpolation '{}'.", other))),
    }
}

fn transformation(path: &str) -> Result<ChannelTransformation, Err> {
    match path {
        "translation" => Ok(ChannelTransformation::Translation),
        "rotation" => Ok(ChannelTransformation::Rotation),
        "scale" => Ok(ChannelTransformation::Scale),
        "weights" => Ok(ChannelTransformation::Weights),
        _ => Err(Err::InvalidValue(format!("Invalid channel path '{}'.", path))),
    }
}

fn scene_node(node_map: &HashMap<usize, SceneNodeIdx>, node: i64) -> Result<SceneNodeIdx, Err> {
    usize::try_from(node)
        .ok()
        .and_then(|node| node_map.get(&node).copied())
        .ok_or_else(|| Err::MalformedDocument("Could not find Node in the scene.".to_owned()))
}

/// Adds the document's animations to `scene`. `node_map` maps document nodes to the
/// scene nodes created for them.
pub(crate) fn decode_animations(
    model: &GltfModel,
    node_map: &HashMap<usize, SceneNodeIdx>,
    scene: &mut Scene,
) -> Result<(), Err> {
    for input in &model.doc.animations {
        let animation = decode_animation(model, input, node_map)?;
        scene.add_animation(animation);
    }
    Ok(())
}

fn decode_animation(
    model: &GltfModel,
    input: &DocAnimation,
    node_map: &HashMap<usize, SceneNodeIdx>,
) -> Result<Animation, Err> {
    let mut animation = Animation::new();
    if let Some(name) = &input.name {
        animation.set_name(name.clone());
    }

    // Samplers often share keyframe times, so every accessor is read once.
    let mut data_indices: HashMap<i64, usize> = HashMap::new();
    let mut data_index = |animation: &mut Animation, accessor: i64, expected| -> Result<usize, Err> {
        if let Some(&index) = data_indices.get(&accessor) {
            // A cached accessor may have been read without a type constraint.
            let ty = &lookup(&model.doc.accessors, accessor, "accessor")?.ty;
            check_data_type(accessor, ty, expected)?;
            return Ok(index);
        }
        let index = animation.add_node_animation_data(read_animation_data(model, accessor, expected)?);
        data_indices.insert(accessor, index);
        Ok(index)
    };

    for sampler in &input.samplers {
        let interpolation = interpolation(sampler.interpolation.as_deref())?;
        let input = data_index(&mut animation, sampler.input, Some(NodeAnimationDataType::Scalar))?;
        let output = data_index(&mut animation, sampler.output, None)?;
        animation.add_sampler(AnimationSampler { input, output, interpolation });
    }

    for channel in &input.channels {
        lookup(&input.samplers, channel.sampler, "animation sampler")?;
        let node = channel.target.node
            .ok_or_else(|| Err::MalformedDocument("Animation channel has no target node.".to_owned()))?;
        animation.add_channel(AnimationChannel {
            target_node: scene_node(node_map, node)?,
            transformation: transformation(&channel.target.path)?,
            sampler: channel.sampler as usize,
        });
    }
    Ok(animation)
}

/// Adds the document's skins to `scene`, in document order.
pub(crate) fn decode_skins(
    model: &GltfModel,
    node_map: &HashMap<usize, SceneNodeIdx>,
    scene: &mut Scene,
) -> Result<(), Err> {
    for input in &model.doc.skins {
        let mut skin = Skin::new();
        if let Some(matrices) = input.inverse_bind_matrices {
            skin.set_inverse_bind_matrices(read_animation_data(model, matrices, Some(NodeAnimationDataType::Mat4))?);
        }
        if let Some(root) = input.skeleton {
            skin.set_joint_root(scene_node(node_map, root)?);
        }
        for &joint in &input.joints {
            skin.add_joint(scene_node(node_map, joint)?);
        }
        scene.add_skin(skin);
    }
    Ok(())
}
