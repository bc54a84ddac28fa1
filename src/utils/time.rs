/// Standard way of showing a countdown in waterminder: zero padded minutes and seconds.
/// Minutes are not wrapped into hours, a two hour interval shows as `120:00`.
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::format_countdown;

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(59), "00:59");
        assert_eq!(format_countdown(1800), "30:00");
        assert_eq!(format_countdown(7199), "119:59");
    }
}
