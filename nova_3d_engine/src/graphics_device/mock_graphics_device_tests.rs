/// Unit tests for MockGraphicsDevice and associated mock types.

use super::*;
use crate::graphics_device::{BufferUsage, BufferUpdateHint, ComponentType, TextureFormat};

fn buffer_desc(name: &str, size: u64) -> BufferDesc {
    BufferDesc {
        name: name.to_string(),
        size,
        usage: BufferUsage::Vertex,
        hint: BufferUpdateHint::Static,
    }
}

// ============================================================================
// Resources
// ============================================================================

#[test]
fn test_mock_buffer_lifetime_tracked() {
    let mut device = MockGraphicsDevice::new();
    let state = device.state();
    let buffer = device.create_buffer(buffer_desc("positions", 36)).unwrap();
    assert_eq!(buffer.size(), 36);
    assert_eq!(state.lock().unwrap().live_buffers, 1);
    drop(buffer);
    assert_eq!(state.lock().unwrap().live_buffers, 0);
    assert_eq!(device.stats().buffers_created, 1);
}

#[test]
fn test_mock_buffer_update_bounds_checked() {
    let mut device = MockGraphicsDevice::new();
    let state = device.state();
    let buffer = device.create_buffer(buffer_desc("b", 8)).unwrap();
    assert!(buffer.update(4, &[0; 4]).is_ok());
    assert!(buffer.update(6, &[0; 4]).is_err());
    assert_eq!(state.lock().unwrap().buffer_updates, vec![("b".to_string(), 4, 4)]);
}

#[test]
fn test_mock_texture_upload_failure_injection() {
    let mut device = MockGraphicsDevice::new();
    let state = device.state();
    let texture = device.create_texture(TextureDesc {
        name: "albedo".to_string(),
        width: 2,
        height: 2,
        format: TextureFormat::Rgba8,
    }).unwrap();
    assert!(texture.update(&[0; 16]).is_ok());
    assert!(texture.update(&[0; 15]).is_err());
    state.lock().unwrap().fail_texture_upload = true;
    assert!(texture.update(&[0; 16]).is_err());
    assert_eq!(state.lock().unwrap().texture_updates.len(), 1);
}

#[test]
fn test_mock_program_failure_injection() {
    let mut device = MockGraphicsDevice::new();
    let state = device.state();
    state.lock().unwrap().fail_program_matching = Some("broken".to_string());
    let desc = |name: &str| ProgramDesc {
        name: name.to_string(),
        vertex_source: String::new(),
        fragment_source: String::new(),
        defines: Vec::new(),
    };
    assert!(matches!(device.create_program(desc("broken|x")), Err(Error::ShaderCompilationFailed(_))));
    let program = device.create_program(desc("fine")).unwrap();
    assert_eq!(program.name(), "fine");
    assert_eq!(state.lock().unwrap().live_programs, 1);
    assert_eq!(device.stats().programs_created, 1);
}

// ============================================================================
// Command list
// ============================================================================

#[test]
fn test_mock_command_list_records_in_order() {
    let mut device = MockGraphicsDevice::new();
    let state = device.state();
    let buffer = device.create_buffer(buffer_desc("p", 12)).unwrap();
    let mut list = device.create_command_list().unwrap();
    list.begin().unwrap();
    list.bind_vertex_buffer("position", &buffer, VertexAttributeLayout {
        component_type: ComponentType::F32,
        components: 3,
        normalized: false,
    }).unwrap();
    list.draw(3, 0, 1).unwrap();
    list.end().unwrap();
    device.submit(list.as_ref()).unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.commands, vec![
        "begin".to_string(),
        "bind_vertex_buffer position 12 x3".to_string(),
        "draw 3 0 1".to_string(),
        "end".to_string(),
    ]);
    assert_eq!(state.submits, 1);
}

#[test]
fn test_mock_command_list_rejects_recording_outside_begin() {
    let mut device = MockGraphicsDevice::new();
    let mut list = device.create_command_list().unwrap();
    assert!(list.draw(3, 0, 1).is_err());
}
