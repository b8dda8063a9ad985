use crate::media::{TextureData, TextureId, TextureStore};
use std::collections::HashMap;

struct Uploaded {
    handle: egui::TextureHandle,
    revision: u64,
}

/// egui-side copies of the texture store, refreshed when a revision changes.
#[derive(Default)]
pub struct SceneTextures {
    uploaded: HashMap<TextureId, Uploaded>,
}

impl SceneTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(&mut self, ctx: &egui::Context, store: &TextureStore) {
        self.uploaded.retain(|id, _| store.get(*id).is_some());
        for id in store.ids() {
            let Some(data) = store.get(id) else {
                continue;
            };
            match self.uploaded.get_mut(&id) {
                Some(entry) if entry.revision == data.revision => {}
                Some(entry) => {
                    entry.handle.set(color_image(data), egui::TextureOptions::LINEAR);
                    entry.revision = data.revision;
                }
                None => {
                    let handle = ctx.load_texture(
                        data.label.clone(),
                        color_image(data),
                        egui::TextureOptions::LINEAR,
                    );
                    log::debug!("Uploaded texture {:?} ({})", id, data.label);
                    self.uploaded.insert(
                        id,
                        Uploaded {
                            handle,
                            revision: data.revision,
                        },
                    );
                }
            }
        }
    }

    pub fn egui_id(&self, id: TextureId) -> Option<egui::TextureId> {
        self.uploaded.get(&id).map(|entry| entry.handle.id())
    }
}

fn color_image(data: &TextureData) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied(data.size, &data.pixels)
}

#[cfg(test)]
mod tests {
    use super::SceneTextures;
    use crate::media::TextureStore;

    #[test]
    fn follows_store_contents() {
        let ctx = egui::Context::default();
        let mut store = TextureStore::new();
        let mut textures = SceneTextures::new();

        let image = store.insert_image("a.png", [1, 1], vec![255, 0, 0, 255], [1; 32]);
        let video = store.create_video("clip.mp4", [2, 2]);
        textures.sync(&ctx, &store);
        assert!(textures.egui_id(image).is_some());
        let video_id = textures.egui_id(video).unwrap();

        assert!(store.write_frame(video, vec![128; 16]));
        textures.sync(&ctx, &store);
        assert_eq!(textures.egui_id(video), Some(video_id));

        store.remove(image);
        textures.sync(&ctx, &store);
        assert!(textures.egui_id(image).is_none());
    }
}
