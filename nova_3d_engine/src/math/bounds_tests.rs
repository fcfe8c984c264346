use glam::{Mat4, Quat, Vec3};
use super::*;

// ============================================================================
// Aabb
// ============================================================================

#[test]
fn test_empty_aabb() {
    let aabb = Aabb::empty();
    assert!(aabb.is_empty());
    assert_eq!(aabb.center(), Vec3::ZERO);
    assert_eq!(aabb.size(), Vec3::ZERO);
    assert!(!aabb.contains_point(Vec3::ZERO));
}

#[test]
fn test_aabb_from_points() {
    let aabb = Aabb::from_points([
        Vec3::new(1.0, -2.0, 0.0),
        Vec3::new(-1.0, 4.0, 3.0),
        Vec3::new(0.0, 0.0, -5.0),
    ]);
    assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, -5.0));
    assert_eq!(aabb.max, Vec3::new(1.0, 4.0, 3.0));
    assert_eq!(aabb.center(), Vec3::new(0.0, 1.0, -1.0));
    assert_eq!(aabb.size(), Vec3::new(2.0, 6.0, 8.0));
}

#[test]
fn test_aabb_union_with_empty_is_identity() {
    let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
    assert_eq!(a.union(&Aabb::empty()), a);
}

#[test]
fn test_aabb_contains_and_intersects() {
    let outer = Aabb::new(Vec3::splat(-2.0), Vec3::splat(2.0));
    let inner = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    let apart = Aabb::new(Vec3::splat(3.0), Vec3::splat(4.0));
    let touching = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));

    assert!(outer.contains(&inner));
    assert!(!inner.contains(&outer));
    assert!(outer.intersects(&inner));
    assert!(!outer.intersects(&apart));
    assert!(outer.intersects(&touching));
}

#[test]
fn test_aabb_transformed_translation_and_scale() {
    let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    let m = Mat4::from_scale_rotation_translation(Vec3::splat(2.0), Quat::IDENTITY, Vec3::new(10.0, 0.0, 0.0));
    let t = aabb.transformed(&m);
    assert_eq!(t.min, Vec3::new(8.0, -2.0, -2.0));
    assert_eq!(t.max, Vec3::new(12.0, 2.0, 2.0));
}

#[test]
fn test_aabb_transformed_rotation_encloses_corners() {
    let aabb = Aabb::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
    let m = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_4);
    let t = aabb.transformed(&m);

    for corner in [
        Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 1.0, 1.0),
    ] {
        let p = m.transform_point3(corner);
        assert!(p.x >= t.min.x - 1e-5 && p.x <= t.max.x + 1e-5);
        assert!(p.y >= t.min.y - 1e-5 && p.y <= t.max.y + 1e-5);
    }
}

#[test]
fn test_aabb_transformed_empty_stays_empty() {
    let t = Aabb::empty().transformed(&Mat4::from_translation(Vec3::ONE));
    assert!(t.is_empty());
}

// ============================================================================
// Sphere
// ============================================================================

#[test]
fn test_sphere_from_points_uses_box_center() {
    let sphere = Sphere::from_points(&[
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(3.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    ]);
    assert_eq!(sphere.center, Vec3::new(1.0, 0.5, 0.0));
    let expected = Vec3::new(-1.0, 0.0, 0.0).distance(sphere.center);
    assert!((sphere.radius - expected).abs() < 1e-6);
}

#[test]
fn test_sphere_from_no_points_is_empty() {
    assert!(Sphere::from_points(&[]).is_empty());
}

#[test]
fn test_sphere_transformed_scales_radius_by_largest_axis() {
    let sphere = Sphere::new(Vec3::X, 1.0);
    let m = Mat4::from_scale_rotation_translation(
        Vec3::new(1.0, 4.0, 2.0),
        Quat::IDENTITY,
        Vec3::new(0.0, 0.0, -3.0),
    );
    let t = sphere.transformed(&m);
    assert!((t.center - Vec3::new(1.0, 0.0, -3.0)).length() < 1e-6);
    assert!((t.radius - 4.0).abs() < 1e-6);
}

#[test]
fn test_sphere_intersects_and_contains() {
    let a = Sphere::new(Vec3::ZERO, 1.0);
    let b = Sphere::new(Vec3::new(1.5, 0.0, 0.0), 1.0);
    let c = Sphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0);
    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
    assert!(a.contains_point(Vec3::new(0.5, 0.5, 0.0)));
    assert!(!Sphere::empty().intersects(&a));
}
