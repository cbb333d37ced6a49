// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::image::{
    ExtensionType, ImageInfo, InterpolationType, TextureDescriptor, TextureTables,
};
use crate::core::sampler::ImageSampler;
use crate::core::udim::UdimRegistry;
use crate::math::constants::UInt;
use crate::textures::memory::CpuImage;
use crate::textures::TexelFilter;

#[derive(Debug)]
pub enum ManifestError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
}

impl From<std::io::Error> for ManifestError {
    fn from(err: std::io::Error) -> Self {
        ManifestError::Io(err)
    }
}

// A fully built texture set: the descriptor tables plus the UDIM
// registry, with the manifest's names resolved to integer ids.
pub struct TextureSet {
    pub tables: Arc<TextureTables>,
    pub udim: Arc<UdimRegistry>,
    textures_by_name: HashMap<String, UInt>,
    images_by_name: HashMap<String, UInt>,
}

impl TextureSet {
    pub fn texture_id(&self, name: &str) -> Option<UInt> {
        self.textures_by_name.get(name).copied()
    }

    pub fn udim_image_id(&self, name: &str) -> Option<UInt> {
        self.images_by_name.get(name).copied()
    }

    pub fn sampler(&self) -> ImageSampler {
        ImageSampler::new(self.tables.clone()).with_udim_mapper(self.udim.clone())
    }
}

// Load a texture manifest: an XML document listing flat `<image>`
// entries and `<udim>` groups of numbered `<tile>` entries, with
// `<default>` elements supplying fallback attribute values.
pub fn load_texture_manifest<P: AsRef<Path>>(path: P) -> Result<TextureSet, ManifestError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_manifest(&xml, base_dir)
}

fn parse_manifest(xml: &str, base_dir: &Path) -> Result<TextureSet, ManifestError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut defaults: HashMap<String, String> = HashMap::new();

    let mut tables = TextureTables::new();
    let mut udim = UdimRegistry::new();
    let mut textures_by_name: HashMap<String, UInt> = HashMap::new();
    let mut images_by_name: HashMap<String, UInt> = HashMap::new();

    let mut in_udim = false;
    let mut current_udim_id: UInt = 0;
    let mut current_udim_interpolation = InterpolationType::Linear;
    let mut current_udim_extension = ExtensionType::Repeat;
    let mut current_udim_srgb = true;
    let mut next_udim_image_id: UInt = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"default" => {
                    let attributes = read_attributes(&e);
                    let key = attributes
                        .get("name")
                        .ok_or(ManifestError::MissingField("name"))?;
                    let value = attributes
                        .get("value")
                        .ok_or(ManifestError::MissingField("value"))?;
                    defaults.insert(key.clone(), value.clone());
                }
                b"image" => {
                    let attributes = read_attributes(&e);
                    let name = attributes
                        .get("name")
                        .ok_or(ManifestError::MissingField("name"))?
                        .clone();
                    let filename = attributes
                        .get("filename")
                        .ok_or(ManifestError::MissingField("filename"))?;

                    let interpolation =
                        parse_interpolation(setting(&attributes, &defaults, "interpolation"))?;
                    let extension =
                        parse_extension(setting(&attributes, &defaults, "extension"))?;
                    let srgb = parse_srgb(setting(&attributes, &defaults, "srgb"))?;

                    let info = load_image(base_dir, filename, srgb, interpolation, extension)?;
                    let slot = tables.push_image(info);
                    let texture_id = tables.push_texture(TextureDescriptor::flat(slot));
                    textures_by_name.insert(name, texture_id);
                }
                b"udim" => {
                    let attributes = read_attributes(&e);
                    let name = attributes
                        .get("name")
                        .ok_or(ManifestError::MissingField("name"))?
                        .clone();

                    current_udim_interpolation =
                        parse_interpolation(setting(&attributes, &defaults, "interpolation"))?;
                    current_udim_extension =
                        parse_extension(setting(&attributes, &defaults, "extension"))?;
                    current_udim_srgb = parse_srgb(setting(&attributes, &defaults, "srgb"))?;

                    current_udim_id = next_udim_image_id;
                    next_udim_image_id += 1;
                    images_by_name.insert(name, current_udim_id);
                    in_udim = true;
                }
                b"tile" => {
                    if !in_udim {
                        return Err(ManifestError::Parse(
                            "tile element outside a udim group".to_string(),
                        ));
                    }

                    let attributes = read_attributes(&e);
                    let number = attributes
                        .get("number")
                        .ok_or(ManifestError::MissingField("number"))?;
                    let number = number.parse::<UInt>().map_err(|_| {
                        ManifestError::Parse(format!("invalid tile number: {}", number))
                    })?;
                    let filename = attributes
                        .get("filename")
                        .ok_or(ManifestError::MissingField("filename"))?;

                    let info = load_image(
                        base_dir,
                        filename,
                        current_udim_srgb,
                        current_udim_interpolation,
                        current_udim_extension,
                    )?;
                    let slot = tables.push_image(info);
                    let texture_id = tables.push_texture(TextureDescriptor::flat(slot));
                    udim.insert(current_udim_id, number, texture_id);
                }
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"udim" {
                    in_udim = false;
                }
            }
            Ok(_) => {}
            Err(e) => {
                return Err(ManifestError::Parse(format!("xml error: {}", e)));
            }
        }
        buf.clear();
    }

    log::info!(
        "Texture manifest parsed, {} textures, {} udim tiles.",
        tables.texture_count(),
        udim.len()
    );

    Ok(TextureSet {
        tables: Arc::new(tables),
        udim: Arc::new(udim),
        textures_by_name,
        images_by_name,
    })
}

fn read_attributes(e: &BytesStart) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().unwrap_or_default().to_string();
        attributes.insert(key, value);
    }
    attributes
}

fn setting<'a>(
    attributes: &'a HashMap<String, String>,
    defaults: &'a HashMap<String, String>,
    key: &str,
) -> Option<&'a str> {
    attributes
        .get(key)
        .or_else(|| defaults.get(key))
        .map(|value| value.as_str())
}

fn parse_interpolation(value: Option<&str>) -> Result<InterpolationType, ManifestError> {
    match value.unwrap_or("linear") {
        "nearest" => Ok(InterpolationType::Nearest),
        "linear" => Ok(InterpolationType::Linear),
        "cubic" => Ok(InterpolationType::Cubic),
        "smart" => Ok(InterpolationType::Smart),
        other => Err(ManifestError::Parse(format!(
            "unknown interpolation: {}",
            other
        ))),
    }
}

fn parse_extension(value: Option<&str>) -> Result<ExtensionType, ManifestError> {
    match value.unwrap_or("repeat") {
        "repeat" => Ok(ExtensionType::Repeat),
        "extend" => Ok(ExtensionType::Extend),
        "clip" => Ok(ExtensionType::Clip),
        "mirror" => Ok(ExtensionType::Mirror),
        other => Err(ManifestError::Parse(format!("unknown extension: {}", other))),
    }
}

fn parse_srgb(value: Option<&str>) -> Result<bool, ManifestError> {
    let value = value.unwrap_or("true");
    value
        .parse::<bool>()
        .map_err(|_| ManifestError::Parse(format!("invalid srgb flag: {}", value)))
}

fn load_image(
    base_dir: &Path,
    filename: &str,
    srgb: bool,
    interpolation: InterpolationType,
    extension: ExtensionType,
) -> Result<ImageInfo, ManifestError> {
    let path = base_dir.join(filename);
    let mut image =
        CpuImage::from_file(&path.to_string_lossy(), srgb).map_err(ManifestError::Parse)?;
    image.set_extension(extension);
    image.set_filter(match interpolation {
        InterpolationType::Nearest => TexelFilter::Nearest,
        _ => TexelFilter::Bilinear,
    });

    log::info!(
        "Texture loaded: {} ({}x{}).",
        filename,
        image.width(),
        image.height()
    );

    Ok(ImageInfo {
        width: image.width(),
        height: image.height(),
        data_type: image.data_type(),
        interpolation,
        data: Arc::new(image),
    })
}
