use crate::constants::BUILD_ANGLE_UNITS;
use glam::Vec2;

/// Split a packed word into consecutive bit fields, lowest bits first.
///
/// Each entry of `widths` is a field size in bits. A negative width marks a
/// signed field: the extracted value is sign-extended (two's complement
/// within that many bits).
pub fn split_bits(value: i32, widths: &[i32]) -> Vec<i32> {
    let mut accum = value as i64;
    let mut out = Vec::with_capacity(widths.len());
    for &width in widths {
        let size = width.unsigned_abs();
        let span = 1i64 << size;
        let mut item = accum & (span - 1);
        if width < 0 && item >= span / 2 {
            item -= span;
        }
        out.push(item as i32);
        accum >>= size;
    }
    out
}

/// Transpose a column-major pixel block into row-major order.
///
/// `out[y * width + x] = data[x * height + y]`. Applying it again with the
/// dimensions swapped restores the input.
pub fn transpose_pixels(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = vec![0u8; data.len()];
    for y in 0..height {
        for x in 0..width {
            out[y * width + x] = data[x * height + y];
        }
    }
    out
}

/// Signed polygon area via the shoelace formula. Positive means counter-clockwise.
pub fn signed_area(points: &[Vec2]) -> f32 {
    let mut area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        area += p.x * q.y - q.x * p.y;
    }
    area / 2.0
}

/// Whether the polygon winds counter-clockwise (strictly positive area).
pub fn is_counter_clockwise(points: &[Vec2]) -> bool {
    signed_area(points) > 0.0
}

/// Even-odd ray casting test against an unordered list of edges.
///
/// Edges do not need to form a single loop, so sectors with holes are
/// handled by passing every wall edge.
pub fn point_in_polygon(point: Vec2, edges: &[(Vec2, Vec2)]) -> bool {
    let mut inside = false;
    for &(a, b) in edges {
        let crosses = (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
        if crosses {
            inside = !inside;
        }
    }
    inside
}

/// Convert a build-engine angle (2048 units per turn) to radians.
pub fn build_angle_to_radians(angle: i16) -> f32 {
    angle as f32 / BUILD_ANGLE_UNITS * std::f32::consts::TAU
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_bits_unsigned_fields() {
        // 0b11_000001 -> reserved = 1, animation = 3
        let fields = split_bits(0b1100_0001, &[6, 2]);
        assert_eq!(fields, vec![1, 3]);
    }

    #[test]
    fn test_split_bits_sign_extension() {
        // offset x = -1 (0xFF), offset y = 5, speed = 9
        let packed = (9 << 24) | (5 << 16) | (0xFF << 8) | 0b01_000000;
        let fields = split_bits(packed, &[6, 2, -8, -8, 4]);
        assert_eq!(fields, vec![0, 1, -1, 5, 9]);
    }

    #[test]
    fn test_split_bits_most_negative() {
        let fields = split_bits(0x80, &[-8]);
        assert_eq!(fields, vec![-128]);
    }

    #[test]
    fn test_transpose_small() {
        // 3 wide, 2 tall, column-major on input
        let columns = [1, 4, 2, 5, 3, 6];
        assert_eq!(transpose_pixels(&columns, 3, 2), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_signed_area_square() {
        let ccw = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        assert_eq!(signed_area(&ccw), 4.0);
        assert!(is_counter_clockwise(&ccw));

        let cw: Vec<Vec2> = ccw.iter().rev().copied().collect();
        assert_eq!(signed_area(&cw), -4.0);
        assert!(!is_counter_clockwise(&cw));
    }

    #[test]
    fn test_point_in_polygon_with_hole() {
        let square = |min: f32, max: f32| {
            let pts = [
                Vec2::new(min, min),
                Vec2::new(max, min),
                Vec2::new(max, max),
                Vec2::new(min, max),
            ];
            (0..4).map(move |i| (pts[i], pts[(i + 1) % 4]))
        };
        let edges: Vec<_> = square(0.0, 10.0).chain(square(4.0, 6.0)).collect();

        assert!(point_in_polygon(Vec2::new(1.0, 1.0), &edges));
        assert!(!point_in_polygon(Vec2::new(5.0, 5.0), &edges));
        assert!(!point_in_polygon(Vec2::new(11.0, 5.0), &edges));
    }

    #[test]
    fn test_build_angle_quarter_turn() {
        let radians = build_angle_to_radians(512);
        assert!((radians - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_transpose_self_inverse(
            (w, h, data) in (1usize..16, 1usize..16).prop_flat_map(|(w, h)| {
                (Just(w), Just(h), proptest::collection::vec(any::<u8>(), w * h))
            })
        ) {
            let once = transpose_pixels(&data, w, h);
            let twice = transpose_pixels(&once, h, w);
            prop_assert_eq!(twice, data);
        }

        #[test]
        fn prop_split_bits_signed_byte(byte in any::<i8>()) {
            let packed = (byte as u8 as i32) << 8;
            let fields = split_bits(packed, &[8, -8]);
            prop_assert_eq!(fields, vec![0, byte as i32]);
        }
    }
}
