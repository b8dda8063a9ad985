use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// CPU-side RGBA8 texture. `revision` bumps on every pixel update so the
/// renderer knows when to re-upload.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub label: String,
    pub size: [usize; 2],
    pub pixels: Vec<u8>,
    pub revision: u64,
}

/// Textures created from dropped media, keyed by id.
#[derive(Default)]
pub struct TextureStore {
    textures: HashMap<TextureId, TextureData>,
    // Image textures only; video frames change so they are never shared.
    by_hash: HashMap<[u8; 32], TextureId>,
    next_id: u32,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store decoded image pixels, reusing an existing texture with the same
    /// content hash.
    pub fn insert_image(
        &mut self,
        label: &str,
        size: [usize; 2],
        pixels: Vec<u8>,
        hash: [u8; 32],
    ) -> TextureId {
        if let Some(id) = self.by_hash.get(&hash) {
            if self.textures.contains_key(id) {
                log::debug!("Reusing texture {:?} for {}", id, label);
                return *id;
            }
        }
        let id = self.allocate(label, size, pixels);
        self.by_hash.insert(hash, id);
        id
    }

    /// Create a black texture that a video stream will write frames into.
    pub fn create_video(&mut self, label: &str, size: [usize; 2]) -> TextureId {
        let pixels = vec![0u8; size[0] * size[1] * 4];
        self.allocate(label, size, pixels)
    }

    /// Replace the pixels of an existing texture. Rejects frames whose length
    /// does not match the texture size.
    pub fn write_frame(&mut self, id: TextureId, pixels: Vec<u8>) -> bool {
        let Some(texture) = self.textures.get_mut(&id) else {
            return false;
        };
        if pixels.len() != texture.size[0] * texture.size[1] * 4 {
            log::warn!(
                "Dropping frame for {:?}: {} bytes for {}x{}",
                id,
                pixels.len(),
                texture.size[0],
                texture.size[1]
            );
            return false;
        }
        texture.pixels = pixels;
        texture.revision += 1;
        true
    }

    pub fn remove(&mut self, id: TextureId) {
        self.textures.remove(&id);
        self.by_hash.retain(|_, value| *value != id);
    }

    pub fn get(&self, id: TextureId) -> Option<&TextureData> {
        self.textures.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = TextureId> + '_ {
        self.textures.keys().copied()
    }

    fn allocate(&mut self, label: &str, size: [usize; 2], pixels: Vec<u8>) -> TextureId {
        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.textures.insert(
            id,
            TextureData {
                label: label.to_string(),
                size,
                pixels,
                revision: 0,
            },
        );
        id
    }
}
