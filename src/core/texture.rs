#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Texture {
    img: Image
}

impl Texture {
    pub fn new() -> Self {
        Self {
            img: Image::new(),
        }
    }
    pub fn set_source_image(&mut self, img: Image) { self.img = img }
    pub fn get_source_image(&self) -> &Image { &self.img }
}


/// Encoded image backing a texture. The bytes are kept as found in the source
/// (png, jpeg, webp, ktx2); nothing is decoded.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Image {
    filename: String,
    mime_type: String,
    encoded_data: Vec<u8>,
}

impl Image {
    pub fn new() -> Self { Self {
        filename: String::new(),
        mime_type: String::new(),
        encoded_data: Vec::new(),
    } }

    // Sets the name of the source image file.
    pub fn set_filename(&mut self, filename: String) { self.filename = filename; }
    pub fn get_filename(&self) -> &str { &self.filename }

    pub fn set_mime_type(&mut self, mime_type: String) { self.mime_type = mime_type; }
    pub fn get_mime_type(&self) -> &str { &self.mime_type }

    pub fn set_encoded_data(&mut self, data: Vec<u8>) { self.encoded_data = data; }
    pub fn get_encoded_data(&self) -> &[u8] { &self.encoded_data }
}


#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TextureLibrary {
    textures: Vec<Texture>,
}

impl TextureLibrary {
    pub fn new() -> Self {
        Self {
            textures: Vec::new(),
        }
    }

    // Pushes a new texture into the library. Returns an index of the newly inserted texture.
    pub fn push(&mut self, texture: Texture) -> usize {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    pub fn num_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn get(&self, index: usize) -> Option<&Texture> {
        self.textures.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Texture> {
        self.textures.get_mut(index)
    }

    /// Removes the texture at `index`. Textures after it shift down by one.
    pub fn remove(&mut self, index: usize) -> Option<Texture> {
        if index < self.textures.len() {
            Some(self.textures.remove(index))
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Type {
    Generic = 0,
    Color = 1,
    Opacity = 2,
    Metallic = 3,
    Roughness = 4,
    MetallicRoughness = 5,
    NormalObjectSpace = 6,
    NormalTangentSpace = 7,
    AmbientOcclusion = 8,
    Emissive = 9,
    SheenColor = 10,
    SheenRoughness = 11,
    Transmission = 12,
    Clearcoat = 13,
    ClearcoatRoughness = 14,
    ClearcoatNormal = 15,
    Thickness = 16,
    Specular = 17,
    SpecularColor = 18,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AxisWrappingMode {
    // Out of bounds access along a texture axis should be clamped to the
    // nearest edge.
    ClampToEdge = 0,
    // Texture is repeated along a texture axis in a mirrored pattern.
    MirroredRepeat,
    // Texture is repeated along a texture axis (tiled textures, glTF default).
    Repeat
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WrappingMode {
    s: AxisWrappingMode,
    t: AxisWrappingMode,
}

impl WrappingMode {
    pub fn new(s: AxisWrappingMode, t: AxisWrappingMode) -> Self {Self{s, t}}
    pub fn new_with_single_mode(mode: AxisWrappingMode) -> Self {Self{s: mode, t: mode}}
    pub fn s(&self) -> AxisWrappingMode {self.s}
    pub fn t(&self) -> AxisWrappingMode {self.t}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FilterType {
    Unspecified = 0,
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear
}


/// A texture as used by a material or a feature id set. The texture itself lives in a
/// [TextureLibrary]; the map refers to it by index.
#[derive(Clone, PartialEq, Debug)]
pub struct TextureMap {
    ty: Type,
    wrapping_mode: WrappingMode,
    tex_coord_index: usize,
    min_filter: FilterType,
    mag_filter: FilterType,
    texture_index: usize,
    transform: TextureTransform,
}

impl TextureMap {
    pub fn new(ty: Type, texture_index: usize) -> Self {
        Self {
            ty,
            wrapping_mode: WrappingMode::new_with_single_mode(AxisWrappingMode::Repeat),
            tex_coord_index: 0,
            min_filter: FilterType::Unspecified,
            mag_filter: FilterType::Unspecified,
            texture_index,
            transform: TextureTransform::default(),
        }
    }

    pub fn set_properties(
        &mut self,
        wrapping_mode: WrappingMode,
        tex_coord_index: usize,
        min_filter: FilterType,
        mag_filter: FilterType,
    ) {
        self.wrapping_mode = wrapping_mode;
        self.tex_coord_index = tex_coord_index;
        self.min_filter = min_filter;
        self.mag_filter = mag_filter;
    }

    pub fn set_transform(&mut self, transform: TextureTransform) {
        self.transform = transform;
    }

    pub fn get_transform(&self) -> &TextureTransform { &self.transform }
    pub fn get_type(&self) -> Type { self.ty }
    pub fn get_texture_index(&self) -> usize { self.texture_index }
    pub(crate) fn set_texture_index(&mut self, index: usize) { self.texture_index = index; }
    pub fn get_wrapping_mode(&self) -> WrappingMode { self.wrapping_mode }
    pub fn tex_coord_index(&self) -> usize { self.tex_coord_index }
    pub fn min_filter(&self) -> FilterType { self.min_filter }
    pub fn mag_filter(&self) -> FilterType { self.mag_filter }
}


/// Contents of the `KHR_texture_transform` extension.
#[derive(Clone, PartialEq, Debug)]
pub struct TextureTransform {
    offset: [f64; 2],
    rotation: f64,
    scale: [f64; 2],
    tex_coord: i32,
}

impl Default for TextureTransform {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.0],
            rotation: 0.0,
            scale: [1.0, 1.0],
            // -1 means the texture map's own tex coord index applies.
            tex_coord: -1,
        }
    }
}

impl TextureTransform {
    pub fn is_default(&self) -> bool {
        self == &TextureTransform::default()
    }

    pub fn set_offset(&mut self, offset: [f64; 2]) { self.offset = offset; }
    pub fn set_rotation(&mut self, rotation: f64) { self.rotation = rotation; }
    pub fn set_scale(&mut self, scale: [f64; 2]) { self.scale = scale; }
    pub fn set_tex_coord(&mut self, tex_coord: i32) { self.tex_coord = tex_coord; }

    pub fn offset(&self) -> &[f64; 2] {
        &self.offset
    }

    pub fn scale(&self) -> &[f64; 2] {
        &self.scale
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn tex_coord(&self) -> i32 {
        self.tex_coord
    }
}


// Helper struct implementing various utilities operating on Texture.
pub struct TextureUtils;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ImageFormat {
    None,
    Png,
    Jpeg,
    Basis,
    Webp,
}

impl TextureUtils {
    /// Returns mime type string for a given image format.
    pub fn get_mime_type(image_format: ImageFormat) -> String {
        match image_format {
            ImageFormat::Png => "image/png".to_string(),
            ImageFormat::Jpeg => "image/jpeg".to_string(),
            ImageFormat::Basis => "image/ktx2".to_string(),
            ImageFormat::Webp => "image/webp".to_string(),
            ImageFormat::None => String::new(),
        }
    }

    /// Returns image format corresponding to a given image file extension. NONE is returned when extension is empty or unknown.
    pub fn get_format(extension: &str) -> ImageFormat {
        match extension {
            "png" => ImageFormat::Png,
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "basis" | "ktx2" => ImageFormat::Basis,
            "webp" => ImageFormat::Webp,
            _ => ImageFormat::None,
        }
    }

    /// Returns the lowercase extension of the file name, or an empty string.
    pub fn lowercase_file_extension(filename: &str) -> String {
        std::path::Path::new(filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// Returns the lowercase image format part of a mime type, e.g. "png" for "image/png".
    pub fn lowercase_mime_type_extension(mime_type: &str) -> String {
        mime_type.split_once('/')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }
}
