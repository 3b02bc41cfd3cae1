/// Stable hex color for a custom event name.
///
/// 32-bit `h = c + (h << 5) - h` over UTF-16 code units; the three low bytes
/// become the RGB channels.
pub fn string_to_color(name: &str) -> String {
    let mut hash: i32 = 0;
    for unit in name.encode_utf16() {
        hash = i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }

    let mut color = String::with_capacity(7);
    color.push('#');
    for i in 0..3 {
        let channel = (hash >> (i * 8)) & 0xFF;
        color.push_str(&format!("{:02x}", channel));
    }
    color
}
