//! Workout export formats the server accepts, recognised by their header line

/// Strong (iOS) export
const STRONG_IOS_HEADER: &str = concat!(
    "Date,Workout Name,Duration,Exercise Name,Set Order,Weight,Reps,",
    "Distance,Seconds,Notes,Workout Notes,RPE"
);

/// Strong (Android) export, semicolon separated
const STRONG_ANDROID_HEADER: &str = concat!(
    "Date;Workout Name;Exercise Name;Set Order;Weight;Weight Unit;Reps;RPE;",
    "Distance;Distance Unit;Seconds;Notes;Workout Notes;Workout Duration"
);

/// DailyStrength (Android) export
const DAILY_STRENGTH_HEADER: &str = concat!(
    r#""Date","Workout name","Exercise","Set","Weight","Reps","#,
    r#""Distance","Duration","Measurement unit","Notes""#
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvFormat {
    StrongIos,
    StrongAndroid,
    DailyStrengthAndroid,
}

impl CsvFormat {
    pub fn name(&self) -> &'static str {
        match self {
            CsvFormat::StrongIos => "Strong (iOS)",
            CsvFormat::StrongAndroid => "Strong (Android)",
            CsvFormat::DailyStrengthAndroid => "DailyStrength (Android)",
        }
    }

    pub fn delimiter(&self) -> char {
        match self {
            CsvFormat::StrongAndroid => ';',
            _ => ',',
        }
    }
}

/// Detect the export format from the first line of a file
pub fn sniff(contents: &[u8]) -> Option<CsvFormat> {
    let first_line = contents.split(|b| *b == b'\n').next()?;
    let header = String::from_utf8_lossy(first_line);
    let header = header.trim_start_matches('\u{feff}').trim_end_matches('\r');

    match header {
        STRONG_IOS_HEADER => Some(CsvFormat::StrongIos),
        STRONG_ANDROID_HEADER => Some(CsvFormat::StrongAndroid),
        DAILY_STRENGTH_HEADER => Some(CsvFormat::DailyStrengthAndroid),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_strong_ios() {
        let row = "2024-01-01 07:00:00,Legs,1h,Squat (Barbell),1,100,5,,,,,";
        let csv = format!("{}\n{}\n", STRONG_IOS_HEADER, row);
        assert_eq!(sniff(csv.as_bytes()), Some(CsvFormat::StrongIos));
    }

    #[test]
    fn test_sniff_strong_android_crlf() {
        let csv = format!("{}\r\n", STRONG_ANDROID_HEADER);
        let format = sniff(csv.as_bytes()).unwrap();
        assert_eq!(format, CsvFormat::StrongAndroid);
        assert_eq!(format.delimiter(), ';');
    }

    #[test]
    fn test_sniff_daily_strength_with_bom() {
        let csv = format!("\u{feff}{}", DAILY_STRENGTH_HEADER);
        assert_eq!(sniff(csv.as_bytes()), Some(CsvFormat::DailyStrengthAndroid));
    }

    #[test]
    fn test_sniff_unknown() {
        assert_eq!(sniff(b"date,lift,kg\n2024-01-01,squat,100\n"), None);
        assert_eq!(sniff(b""), None);
    }

    #[test]
    fn test_delimiter_splits_header() {
        let headers = [
            (CsvFormat::StrongIos, STRONG_IOS_HEADER, 12),
            (CsvFormat::StrongAndroid, STRONG_ANDROID_HEADER, 14),
            (CsvFormat::DailyStrengthAndroid, DAILY_STRENGTH_HEADER, 10),
        ];
        for (format, header, columns) in headers {
            assert_eq!(header.split(format.delimiter()).count(), columns, "{}", format.name());
        }
    }
}
