//! File names for generated documents and archives.

use chrono::NaiveDate;

use super::{DocumentKind, OutputFormat};

const FALLBACK_TITLE: &str = "Belge";
pub const ARCHIVE_PREFIX: &str = "ISG_Belgeleri";

/// Fold Turkish letters to their ASCII base.
pub fn to_ascii(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            'ç' => 'c',
            'Ç' => 'C',
            'ğ' => 'g',
            'Ğ' => 'G',
            'ı' => 'i',
            'İ' => 'I',
            'ö' => 'o',
            'Ö' => 'O',
            'ş' => 's',
            'Ş' => 'S',
            'ü' => 'u',
            'Ü' => 'U',
            'â' => 'a',
            'Â' => 'A',
            'î' => 'i',
            'Î' => 'I',
            'û' => 'u',
            'Û' => 'U',
            other => other,
        })
        .collect()
}

/// First two words of a title, ASCII-folded and stripped of characters file systems reject.
pub fn short_title(title: &str) -> String {
    let folded = to_ascii(title);
    let words: Vec<String> = folded
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '&'))
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .take(2)
        .collect();

    if words.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        words.join(" ")
    }
}

/// `<two words> - <kind suffix>.<ext>`
pub fn document_file_name(title: &str, kind: DocumentKind, format: OutputFormat) -> String {
    format!("{} - {}.{}", short_title(title), kind.file_suffix(), format.extension())
}

/// `<two words> - <kind suffix>.zip`, for one request that yielded several files.
pub fn bundle_file_name(title: &str, kind: DocumentKind) -> String {
    format!("{} - {}.zip", short_title(title), kind.file_suffix())
}

/// `ISG_Belgeleri_<dd.mm.yyyy>.zip`
pub fn archive_file_name(date: NaiveDate) -> String {
    format!("{}_{}.zip", ARCHIVE_PREFIX, date.format("%d.%m.%Y"))
}

/// Insert ` (n)` before the extension.
pub fn numbered(name: &str, n: usize) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({}){}", &name[..dot], n, &name[dot..]),
        _ => format!("{} ({})", name, n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_title_folds_turkish_letters() {
        assert_eq!(short_title("Örnek İnşaat Sanayi A.Ş."), "Ornek Insaat");
        assert_eq!(short_title("Çağlar"), "Caglar");
        assert_eq!(short_title("  /  "), "Belge");
    }

    #[test]
    fn test_document_file_name() {
        let name = document_file_name(
            "Güneş Enerji Ticaret Ltd. Şti.",
            DocumentKind::EmergencyPlan,
            OutputFormat::Pdf,
        );
        assert_eq!(name, "Gunes Enerji - Acil Durum Eylem Plani.pdf");
        let word = document_file_name("Deniz Lojistik", DocumentKind::WorkPermit, OutputFormat::Word);
        assert_eq!(word, "Deniz Lojistik - Calisma Izni.docx");
        assert_eq!(
            bundle_file_name("Deniz Lojistik A.Ş.", DocumentKind::Certificate),
            "Deniz Lojistik - Egitim Sertifikasi.zip"
        );
    }

    #[test]
    fn test_archive_name_and_numbering() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(archive_file_name(date), "ISG_Belgeleri_05.03.2026.zip");
        assert_eq!(numbered("A B - Calisma Izni.pdf", 2), "A B - Calisma Izni (2).pdf");
        assert_eq!(numbered("README", 3), "README (3)");
    }
}
