use shoe_vision::core_modules::box_topology::{BoxKeypoint, DetectedBox};
use shoe_vision::core_modules::color::{AxisColors, Color};
use shoe_vision::core_modules::geometry::{compute_axis_midpoints, line_intersection, Axis};
use shoe_vision::core_modules::keypoint::Keypoint;
use shoe_vision::core_modules::overlay_renderer::{
    axis_indicators, draw_triangle, render_axes, AXIS_LINE_WIDTH, TRIANGLE_OUTLINE_WIDTH,
};
use shoe_vision::core_modules::raster::RasterSurface;
use shoe_vision::core_modules::surface::{DrawCommand, DrawingSurface, RecordingSurface, Transform};
use std::f64::consts::FRAC_PI_4;

const TOLERANCE: f64 = 1e-6;

/// A cube seen head-on in perspective: the back face is the smaller square.
fn synthetic_cube() -> DetectedBox {
    let mut keypoints = [Keypoint::default(); 9];
    for (role, x, y) in [
        (BoxKeypoint::Center, 0.48, 0.52),
        (BoxKeypoint::BackBottomLeft, 0.4, 0.6),
        (BoxKeypoint::BackBottomRight, 0.6, 0.6),
        (BoxKeypoint::BackTopLeft, 0.4, 0.4),
        (BoxKeypoint::BackTopRight, 0.6, 0.4),
        (BoxKeypoint::FrontBottomLeft, 0.3, 0.7),
        (BoxKeypoint::FrontBottomRight, 0.7, 0.7),
        (BoxKeypoint::FrontTopLeft, 0.3, 0.3),
        (BoxKeypoint::FrontTopRight, 0.7, 0.3),
    ] {
        keypoints[role.index()] = Keypoint::new(x, y);
    }
    DetectedBox::from_keypoints(&keypoints).expect("valid cube")
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn cube_midpoints_and_rotations_match_hand_computed_values() {
    let cube = synthetic_cube();
    let midpoints = compute_axis_midpoints(&cube);

    let x = midpoints.x.expect("x axis");
    assert_close(x.x, 0.6 + 1.0 / 30.0);
    assert_close(x.y, 0.5);
    let y = midpoints.y.expect("y axis");
    assert_close(y.x, 0.5);
    assert_close(y.y, 0.4 - 1.0 / 30.0);
    let z = midpoints.z.expect("z axis");
    assert_close(z.x, 0.5);
    assert_close(z.y, 0.5);

    let indicators = axis_indicators(&cube);
    let rotations: Vec<(Axis, f64)> = indicators.iter().map(|i| (i.axis, i.rotation)).collect();
    assert_eq!(rotations.len(), 3);
    // Ray to x: (+0.15333, -0.02); ray to y: (+0.02, -0.15333); ray to z: (+0.02, -0.02).
    assert_eq!(rotations[0].0, Axis::X);
    assert_close(rotations[0].1, std::f64::consts::FRAC_PI_2 - (3.0_f64 / 23.0).atan());
    assert_eq!(rotations[1].0, Axis::Y);
    assert_close(rotations[1].1, std::f64::consts::FRAC_PI_2 - (23.0_f64 / 3.0).atan());
    assert_eq!(rotations[2].0, Axis::Z);
    assert_close(rotations[2].1, FRAC_PI_4);
}

#[test]
fn cube_renders_at_scaled_pixel_positions() {
    let cube = synthetic_cube();
    let mut surface = RecordingSurface::new(100, 100);
    render_axes(&mut surface, &cube, &AxisColors::default());

    let rays: Vec<&DrawCommand> = surface
        .paint_commands()
        .filter(|c| matches!(c, DrawCommand::StrokePolyline { line_width, .. } if *line_width == AXIS_LINE_WIDTH))
        .collect();
    assert_eq!(rays.len(), 3);

    let expected_tips = [(63.333333, 50.0), (50.0, 36.666667), (50.0, 50.0)];
    let expected_colors = [Color::GREEN, Color::RED, Color::BLUE];
    for ((ray, tip), expected_color) in rays.iter().zip(expected_tips).zip(expected_colors) {
        let DrawCommand::StrokePolyline { points, color, .. } = ray else {
            unreachable!()
        };
        assert_eq!(*color, expected_color);
        assert_close(points[0].0, 48.0);
        assert_close(points[0].1, 52.0);
        assert!((points[1].0 - tip.0).abs() < 1e-5);
        assert!((points[1].1 - tip.1).abs() < 1e-5);
    }
}

#[test]
fn triangle_is_translated_to_scaled_point() {
    let (width, height) = (640, 480);
    let point = Keypoint::new(0.25, 0.75);
    let mut surface = RecordingSurface::new(width, height);
    draw_triangle(&mut surface, &point, 16.0, 16.0, Color::GREEN, 1.0);

    // The first transform change is the translate to the point in pixels.
    let translate = surface
        .commands()
        .iter()
        .find_map(|c| match c {
            DrawCommand::SetTransform(t) => Some(*t),
            _ => None,
        })
        .expect("a transform change");
    assert_close(translate.e, 0.25 * width as f64);
    assert_close(translate.f, 0.75 * height as f64);

    // The base of the triangle is centred on the same pixel, whatever the rotation.
    let Some(DrawCommand::FillPolygon { points, .. }) = surface
        .paint_commands()
        .find(|c| matches!(c, DrawCommand::FillPolygon { .. }))
    else {
        panic!("triangle was not filled");
    };
    assert_close((points[0].0 + points[2].0) / 2.0, 160.0);
    assert_close((points[0].1 + points[2].1) / 2.0, 360.0);

    assert_eq!(
        surface.commands().last(),
        Some(&DrawCommand::SetTransform(Transform::IDENTITY))
    );
}

#[test]
fn repeated_rendering_is_pixel_identical() {
    let cube = synthetic_cube();
    let colors = AxisColors::default();

    let mut first = RasterSurface::new(100, 100);
    render_axes(&mut first, &cube, &colors);
    assert_eq!(first.transform(), Transform::IDENTITY);

    let mut second = RasterSurface::new(100, 100);
    render_axes(&mut second, &cube, &colors);
    assert_eq!(first.image(), second.image());

    // Reusing a cleared surface gives the same picture too.
    first.clear(Color { r: 0, g: 0, b: 0, a: 0 });
    render_axes(&mut first, &cube, &colors);
    render_axes(&mut second, &cube, &colors);
    let mut third = RasterSurface::new(100, 100);
    render_axes(&mut third, &cube, &colors);
    assert_eq!(first.image(), third.image());
    assert_eq!(second.transform(), Transform::IDENTITY);
}

#[test]
fn rendered_axes_paint_their_colours() {
    let mut surface = RasterSurface::new(100, 100);
    render_axes(&mut surface, &synthetic_cube(), &AxisColors::default());
    let image = surface.image();
    // Along the x ray, away from the arrowheads.
    assert_eq!(image.get_pixel(60, 50), &Color::GREEN.to_rgba());
    // Inside the y arrowhead, just above its base.
    assert_eq!(image.get_pixel(50, 33), &Color::RED.to_rgba());
}

#[test]
fn parallel_diagonals_leave_the_axis_out_without_panicking() {
    assert_eq!(
        line_intersection(
            [Keypoint::new(0.0, 0.0), Keypoint::new(1.0, 0.0)],
            [Keypoint::new(0.0, 1.0), Keypoint::new(1.0, 1.0)],
        ),
        None
    );

    // Every corner on one horizontal line: all diagonals are collinear.
    let keypoints: Vec<Keypoint> = (0..9).map(|i| Keypoint::new(i as f64 / 8.0, 0.5)).collect();
    let flat = DetectedBox::from_keypoints(&keypoints).unwrap();
    assert_eq!(compute_axis_midpoints(&flat).degenerate_count(), 3);

    let mut surface = RasterSurface::new(50, 50);
    render_axes(&mut surface, &flat, &AxisColors::default());
    assert!(surface.image().pixels().all(|p| p.0 == [0, 0, 0, 0]));
}

#[test]
fn rays_are_drawn_before_any_arrowhead() {
    let mut surface = RecordingSurface::new(100, 100);
    let skipped = render_axes(&mut surface, &synthetic_cube(), &AxisColors::default());
    assert_eq!(skipped, 0);

    let paints: Vec<&DrawCommand> = surface.paint_commands().collect();
    assert_eq!(paints.len(), 3 + 3 * 2);
    for ray in &paints[..3] {
        assert!(matches!(
            ray,
            DrawCommand::StrokePolyline { line_width, .. } if *line_width == AXIS_LINE_WIDTH
        ));
    }
    let expected_colors = [Color::GREEN, Color::RED, Color::BLUE];
    for (pair, expected_color) in paints[3..].chunks_exact(2).zip(expected_colors) {
        assert!(matches!(pair[0], DrawCommand::FillPolygon { color, .. } if *color == expected_color));
        assert!(matches!(
            pair[1],
            DrawCommand::StrokePolyline { color, line_width, .. }
                if *color == expected_color && *line_width == TRIANGLE_OUTLINE_WIDTH
        ));
    }
}

#[test]
fn nearly_parallel_ray_is_clipped_to_the_canvas() {
    let far = line_intersection(
        [Keypoint::new(0.0, 0.0), Keypoint::new(1.0, 0.0)],
        [Keypoint::new(0.0, 1.0), Keypoint::new(1.0, 1.0 + 1e-11)],
    )
    .expect("lines are not quite parallel");
    assert!(far.x < -1e10);

    let mut surface = RasterSurface::new(50, 50);
    let center = Keypoint::new(0.5, 0.5).to_pixel(50, 50);
    surface.stroke_line(center, far.to_pixel(50, 50), Color::GREEN, AXIS_LINE_WIDTH);

    // The visible part is an 8 px band running left from the centre.
    let painted: Vec<(u32, u32)> = surface
        .image()
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0 != [0, 0, 0, 0])
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!painted.is_empty());
    assert!(painted.iter().all(|&(x, y)| x < 25 && (21..29).contains(&y)));
    assert_eq!(surface.image().get_pixel(0, 25), &Color::GREEN.to_rgba());
}
