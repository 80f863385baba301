use super::SceneNodeIdx;

/// Shape of the samples stored in a [NodeAnimationData].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAnimationDataType {
    Scalar,
    Vec3,
    Vec4,
    Mat4,
}

impl NodeAnimationDataType {
    pub fn num_components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
            Self::Mat4 => 16,
        }
    }
}

/// Float samples used as animation keyframe times, keyframe values or inverse bind matrices.
/// `data` holds `count * ty.num_components()` values, one sample after another.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAnimationData {
    ty: NodeAnimationDataType,
    count: usize,
    normalized: bool,
    data: Vec<f32>,
}

impl NodeAnimationData {
    pub fn new(ty: NodeAnimationDataType, normalized: bool, data: Vec<f32>) -> Self {
        let count = data.len() / ty.num_components();
        Self { ty, count, normalized, data }
    }

    pub fn get_type(&self) -> NodeAnimationDataType {
        self.ty
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the sample at `index`.
    pub fn sample(&self, index: usize) -> Option<&[f32]> {
        let n = self.ty.num_components();
        self.data.get(index * n..(index + 1) * n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerInterpolation {
    Linear,
    Step,
    CubicSpline,
}

/// Keyframes of an animation: times from `input` and values from `output`, both indices
/// into the animation's node animation data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationSampler {
    pub input: usize,
    pub output: usize,
    pub interpolation: SamplerInterpolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTransformation {
    Translation,
    Rotation,
    Scale,
    Weights,
}

/// Drives one property of one scene node with a sampler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationChannel {
    pub target_node: SceneNodeIdx,
    pub transformation: ChannelTransformation,
    pub sampler: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Animation {
    name: String,
    channels: Vec<AnimationChannel>,
    samplers: Vec<AnimationSampler>,
    node_animation_data: Vec<NodeAnimationData>,
}

impl Animation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn add_channel(&mut self, channel: AnimationChannel) -> usize {
        self.channels.push(channel);
        self.channels.len() - 1
    }

    pub fn channels(&self) -> &[AnimationChannel] {
        &self.channels
    }

    pub fn add_sampler(&mut self, sampler: AnimationSampler) -> usize {
        self.samplers.push(sampler);
        self.samplers.len() - 1
    }

    pub fn samplers(&self) -> &[AnimationSampler] {
        &self.samplers
    }

    pub fn add_node_animation_data(&mut self, data: NodeAnimationData) -> usize {
        self.node_animation_data.push(data);
        self.node_animation_data.len() - 1
    }

    pub fn get_node_animation_data(&self, index: usize) -> Option<&NodeAnimationData> {
        self.node_animation_data.get(index)
    }

    pub fn num_node_animation_data(&self) -> usize {
        self.node_animation_data.len()
    }
}

/// Binds the joints of a skinned mesh to scene nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    inverse_bind_matrices: NodeAnimationData,
    joint_root: Option<SceneNodeIdx>,
    joints: Vec<SceneNodeIdx>,
}

impl Skin {
    pub fn new() -> Self {
        Self {
            inverse_bind_matrices: NodeAnimationData::new(NodeAnimationDataType::Mat4, false, Vec::new()),
            joint_root: None,
            joints: Vec::new(),
        }
    }

    pub fn set_inverse_bind_matrices(&mut self, data: NodeAnimationData) {
        self.inverse_bind_matrices = data;
    }

    pub fn get_inverse_bind_matrices(&self) -> &NodeAnimationData {
        &self.inverse_bind_matrices
    }

    pub fn set_joint_root(&mut self, node: SceneNodeIdx) {
        self.joint_root = Some(node);
    }

    pub fn get_joint_root(&self) -> Option<SceneNodeIdx> {
        self.joint_root
    }

    pub fn add_joint(&mut self, node: SceneNodeIdx) {
        self.joints.push(node);
    }

    pub fn joints(&self) -> &[SceneNodeIdx] {
        &self.joints
    }
}

impl Default for Skin {
    fn default() -> Self {
        Self::new()
    }
}
