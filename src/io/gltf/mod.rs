pub mod decode;
pub mod scene_io;

pub(crate) mod accessor;
pub(crate) mod animation;
pub(crate) mod document;
pub(crate) mod extensions;
pub(crate) mod json_util;
pub(crate) mod materials;
pub(crate) mod primitive;
pub(crate) mod stats;
pub(crate) mod walker;
