use super::*;
use glam::Vec3;

#[test]
fn test_summary_counts_each_kind() {
    let mut summary = LightSummary::default();
    summary.add(&Light::ambient(Vec3::ONE, 0.2));
    summary.add(&Light::directional(Vec3::ONE, 1.0));
    summary.add(&Light::directional(Vec3::ONE, 1.0));
    summary.add(&Light::point(Vec3::ONE, 1.0, 0.0, 2.0));
    summary.add(&Light::spot(Vec3::ONE, 1.0, 10.0, 0.5, 0.1, 2.0));
    summary.add(&Light::hemisphere(Vec3::ONE, Vec3::ZERO, 0.5));

    assert_eq!(summary.ambient, 1);
    assert_eq!(summary.directional, 2);
    assert_eq!(summary.point, 1);
    assert_eq!(summary.spot, 1);
    assert_eq!(summary.hemisphere, 1);
    assert_eq!(summary.total(), 6);
    assert_eq!(summary.shadow_casters, 0);
}

#[test]
fn test_shadow_casters_only_for_shadow_capable_lights() {
    let mut summary = LightSummary::default();
    summary.add(&Light::directional(Vec3::ONE, 1.0).with_shadow(true));
    summary.add(&Light::ambient(Vec3::ONE, 1.0).with_shadow(true));
    assert_eq!(summary.shadow_casters, 1);
}

#[test]
fn test_key_fragment_changes_with_counts() {
    let empty = LightSummary::default();
    let mut one = LightSummary::default();
    one.add(&Light::point(Vec3::ONE, 1.0, 0.0, 2.0));
    assert_ne!(empty.key_fragment(), one.key_fragment());
    assert_eq!(empty.key_fragment(), LightSummary::default().key_fragment());
}
