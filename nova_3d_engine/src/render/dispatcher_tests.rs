/// Unit tests for dispatcher.rs
///
/// Call sequence, redundant state suppression, ranges, instancing and
/// failure isolation, recorded through the mock backend.

use super::*;
use glam::{Mat4, Vec3};
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, SharedMockState};
use crate::resource::{
    BufferAttribute, Geometry, GeometryGroup, GeometryKey, Material, RenderBucket,
    ShaderSource, Texture as CpuTexture, TextureFormat, POSITION,
};
use crate::scene::{Camera, NodeKey, Scene};

// ============================================================================
// Helper Functions
// ============================================================================

struct Fixture {
    device: MockGraphicsDevice,
    state: SharedMockState,
    cache: ResourceCache,
    resources: ResourceManager,
    view: CameraView,
    lights: LightSummary,
    config: RenderConfig,
    node: NodeKey,
}

fn fixture() -> Fixture {
    let mut scene = Scene::new();
    let camera = scene.create_camera("cam", Camera::perspective(60f32.to_radians(), 1.0, 0.1, 100.0).unwrap());
    let root = scene.root();
    scene.add(root, camera).unwrap();
    scene.update_matrix_world(false);
    let view = scene.camera_view(camera).unwrap();
    let device = MockGraphicsDevice::new();
    let state = device.state();
    Fixture {
        device,
        state,
        cache: ResourceCache::new(),
        resources: ResourceManager::new(),
        view,
        lights: LightSummary::default(),
        config: RenderConfig::default(),
        node: camera,
    }
}

fn positions(n: usize) -> BufferAttribute {
    let points: Vec<Vec3> = (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
    BufferAttribute::from_vec3(&points)
}

impl Fixture {
    fn geometry(&mut self, vertices: usize) -> GeometryKey {
        let mut geometry = Geometry::new("geo");
        geometry.set_attribute(POSITION, positions(vertices)).unwrap();
        self.resources.add_geometry(geometry)
    }

    fn material(&mut self, name: &str, shader: &str) -> MaterialKey {
        self.resources.add_material(Material::new(name, ShaderSource::new(shader, "vs", "fs")))
    }

    fn command(&self, geometry: GeometryKey, material: MaterialKey) -> DrawCommand {
        DrawCommand {
            node: self.node,
            geometry,
            material,
            group: None,
            world_matrix: Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)),
            z: 5.0,
            render_order: 0,
            sequence: 0,
            instance_count: None,
            vertex_colors: false,
        }
    }

    /// Dispatch commands in insertion order, returning the recorded calls
    fn run(&mut self, dispatcher: &mut Dispatcher, commands: Vec<DrawCommand>) -> (DispatchStats, Vec<String>) {
        let mut list = RenderList::new();
        for command in commands {
            list.push(RenderBucket::Opaque, command);
        }
        let mut cmd = self.device.create_command_list().unwrap();
        cmd.begin().unwrap();
        dispatcher.begin_frame();
        let stats = {
            let mut ctx = DispatchContext {
                device: &mut self.device,
                cache: &mut self.cache,
                resources: &mut self.resources,
                view: &self.view,
                lights: &self.lights,
                config: &self.config,
            };
            dispatcher.dispatch(&list, &mut ctx, cmd.as_mut())
        };
        cmd.end().unwrap();
        let mut state = self.state.lock().unwrap();
        let recorded = state.commands.clone();
        state.clear_commands();
        (stats, recorded)
    }
}

fn count(commands: &[String], prefix: &str) -> usize {
    commands.iter().filter(|c| c.starts_with(prefix)).count()
}

fn position_of(commands: &[String], prefix: &str) -> usize {
    commands.iter().position(|c| c.starts_with(prefix)).unwrap()
}

// ============================================================================
// Sequence
// ============================================================================

#[test]
fn test_single_draw_follows_fixed_sequence() {
    let mut f = fixture();
    let geometry = f.geometry(3);
    let material = f.material("m", "basic");
    let command = f.command(geometry, material);
    let (stats, commands) = f.run(&mut Dispatcher::new(), vec![command]);

    assert_eq!(stats.draw_calls, 1);
    let program = position_of(&commands, "bind_program basic#");
    let buffer = position_of(&commands, "bind_vertex_buffer position 36 x3");
    let uniform = position_of(&commands, "set_uniform modelMatrix");
    let blend = position_of(&commands, "set_blend_state false");
    let depth = position_of(&commands, "set_depth_state true true");
    let raster = position_of(&commands, "set_raster_state Back CounterClockwise");
    let draw = position_of(&commands, "draw 3 0 1");
    assert!(program < buffer && buffer < uniform && uniform < blend);
    assert!(blend < depth && depth < raster && raster < draw);
}

#[test]
fn test_engine_uniforms_sent_every_draw() {
    let mut f = fixture();
    let geometry = f.geometry(3);
    let material = f.material("m", "basic");
    let commands = vec![f.command(geometry, material), f.command(geometry, material)];
    let (_, recorded) = f.run(&mut Dispatcher::new(), commands);
    for name in ["modelMatrix", "viewMatrix", "projectionMatrix", "modelViewMatrix", "normalMatrix", "cameraPosition"] {
        assert_eq!(count(&recorded, &format!("set_uniform {}", name)), 2, "{}", name);
    }
}

#[test]
fn test_redundant_binds_and_state_suppressed() {
    let mut f = fixture();
    let geometry = f.geometry(3);
    let material = f.material("m", "basic");
    f.resources.material_mut(material).unwrap().set_uniform("color", UniformValue::Color(Vec3::ONE));
    let commands = vec![f.command(geometry, material), f.command(geometry, material)];
    let (stats, recorded) = f.run(&mut Dispatcher::new(), commands);

    assert_eq!(stats.draw_calls, 2);
    assert_eq!(count(&recorded, "bind_program"), 1);
    assert_eq!(count(&recorded, "bind_vertex_buffer"), 1);
    assert_eq!(count(&recorded, "set_blend_state"), 1);
    assert_eq!(count(&recorded, "set_depth_state"), 1);
    assert_eq!(count(&recorded, "set_raster_state"), 1);
    assert_eq!(count(&recorded, "set_uniform color"), 1);
    assert_eq!(stats.program_binds, 1);
    assert_eq!(stats.state_changes, 3);
}

#[test]
fn test_material_uniforms_resent_when_material_alternates() {
    let mut f = fixture();
    let geometry = f.geometry(3);
    let a = f.material("a", "basic");
    let b = f.material("b", "basic");
    f.resources.material_mut(a).unwrap().set_uniform("color", UniformValue::Color(Vec3::X));
    f.resources.material_mut(b).unwrap().set_uniform("color", UniformValue::Color(Vec3::Y));
    let commands = vec![f.command(geometry, a), f.command(geometry, b), f.command(geometry, a)];
    let (_, recorded) = f.run(&mut Dispatcher::new(), commands);

    // same shader and defines: one shared program
    assert_eq!(count(&recorded, "bind_program"), 1);
    assert_eq!(count(&recorded, "set_uniform color"), 3);
}

#[test]
fn test_shadow_state_reset_each_frame() {
    let mut f = fixture();
    let geometry = f.geometry(3);
    let material = f.material("m", "basic");
    let mut dispatcher = Dispatcher::new();
    let command = f.command(geometry, material);
    f.run(&mut dispatcher, vec![command.clone()]);
    let (_, recorded) = f.run(&mut dispatcher, vec![command]);
    assert_eq!(count(&recorded, "bind_program"), 1);
    assert_eq!(count(&recorded, "bind_vertex_buffer"), 1);
    // nothing re-uploaded
    assert_eq!(f.cache.stats().buffer_uploads, 1);
}

// ============================================================================
// Draw calls
// ============================================================================

#[test]
fn test_indexed_geometry_uses_draw_indexed() {
    let mut f = fixture();
    let geometry = f.geometry(4);
    f.resources.geometry_mut(geometry).unwrap()
        .set_index(Some(BufferAttribute::index_u16(vec![0, 1, 2, 2, 3, 0]))).unwrap();
    let material = f.material("m", "basic");
    let command = f.command(geometry, material);
    let (_, recorded) = f.run(&mut Dispatcher::new(), vec![command]);
    assert_eq!(count(&recorded, "bind_index_buffer 12 U16"), 1);
    assert_eq!(count(&recorded, "draw_indexed 6 0 1"), 1);
    assert_eq!(count(&recorded, "draw "), 0);
}

#[test]
fn test_group_clipped_by_draw_range() {
    let mut f = fixture();
    let geometry = f.geometry(9);
    f.resources.geometry_mut(geometry).unwrap().set_draw_range(1, 4);
    let material = f.material("m", "basic");
    let mut command = f.command(geometry, material);
    command.group = Some(GeometryGroup { start: 3, count: 6, material_index: 0 });
    let (_, recorded) = f.run(&mut Dispatcher::new(), vec![command]);
    assert_eq!(count(&recorded, "draw 2 3 1"), 1);
}

#[test]
fn test_empty_ranges_are_not_drawn() {
    let mut f = fixture();
    let geometry = f.geometry(6);
    f.resources.geometry_mut(geometry).unwrap().set_draw_range(0, 5);
    let material = f.material("m", "basic");
    let mut outside = f.command(geometry, material);
    outside.group = Some(GeometryGroup { start: 5, count: 2, material_index: 0 });
    let mut no_instances = f.command(geometry, material);
    no_instances.instance_count = Some(0);
    let (stats, recorded) = f.run(&mut Dispatcher::new(), vec![outside, no_instances]);
    assert_eq!(stats.empty, 2);
    assert_eq!(stats.draw_calls, 0);
    assert_eq!(count(&recorded, "draw"), 0);
}

#[test]
fn test_instanced_draw_selects_instancing_program() {
    let mut f = fixture();
    let geometry = f.geometry(3);
    let material = f.material("m", "basic");
    let mut command = f.command(geometry, material);
    command.instance_count = Some(4);
    let (_, recorded) = f.run(&mut Dispatcher::new(), vec![command]);
    assert_eq!(count(&recorded, "draw 3 0 4"), 1);
    let state = f.state.lock().unwrap();
    assert!(state.compiled_programs[0].defines.iter().any(|d| d == "USE_INSTANCING"));
}

#[test]
fn test_mirrored_transform_flips_front_face() {
    let mut f = fixture();
    let geometry = f.geometry(3);
    let material = f.material("m", "basic");
    let mut command = f.command(geometry, material);
    command.world_matrix = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
    let (_, recorded) = f.run(&mut Dispatcher::new(), vec![command]);
    assert_eq!(count(&recorded, "set_raster_state Back Clockwise"), 1);
}

#[test]
fn test_texture_bound_to_unit_with_sampler_uniform() {
    let mut f = fixture();
    let geometry = f.geometry(3);
    let material = f.material("m", "basic");
    let texture = f.resources.add_texture(
        CpuTexture::new("checker", 2, 2, TextureFormat::Rgba8, vec![255; 16]).unwrap(),
    );
    f.resources.material_mut(material).unwrap().set_uniform("map", UniformValue::Texture(Some(texture)));
    let commands = vec![f.command(geometry, material), f.command(geometry, material)];
    let (stats, recorded) = f.run(&mut Dispatcher::new(), commands);
    assert_eq!(count(&recorded, "bind_texture 0 2x2"), 1);
    assert_eq!(count(&recorded, "set_uniform map"), 1);
    assert_eq!(stats.texture_binds, 1);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_disposed_geometry_skips_only_that_draw() {
    let mut f = fixture();
    let gone = f.geometry(3);
    let kept = f.geometry(3);
    let material = f.material("m", "basic");
    f.resources.dispose_geometry(gone).unwrap();
    let commands = vec![f.command(gone, material), f.command(kept, material)];
    let (stats, recorded) = f.run(&mut Dispatcher::new(), commands);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(count(&recorded, "draw 3 0 1"), 1);
}

#[test]
fn test_compile_failure_skips_draw() {
    let mut f = fixture();
    f.state.lock().unwrap().fail_program_matching = Some("broken".to_string());
    let geometry = f.geometry(3);
    let broken = f.material("bad", "broken");
    let fine = f.material("good", "basic");
    let commands = vec![f.command(geometry, broken), f.command(geometry, fine)];
    let (stats, recorded) = f.run(&mut Dispatcher::new(), commands);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(count(&recorded, "bind_program broken"), 0);
}

#[test]
fn test_corrupted_index_skips_draw() {
    let mut f = fixture();
    let geometry = f.geometry(3);
    {
        let geo = f.resources.geometry_mut(geometry).unwrap();
        geo.set_index(Some(BufferAttribute::index_u16(vec![0, 1, 2]))).unwrap();
        geo.index_mut().unwrap().set_x(0, 99.0).unwrap();
    }
    let material = f.material("m", "basic");
    let command = f.command(geometry, material);
    let (stats, recorded) = f.run(&mut Dispatcher::new(), vec![command]);
    assert_eq!(stats.skipped, 1);
    assert_eq!(count(&recorded, "draw"), 0);
}
