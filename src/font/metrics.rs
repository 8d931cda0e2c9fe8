//! Advance widths for the standard PDF fonts, from Adobe's published AFM
//! data for the base 14 fonts.
//!
//! Widths are in 1/1000 em. The printable ASCII range and the punctuation
//! common in Spanish text are tabulated per face; other Latin-1 letters
//! reuse the width of their base letter, which matches the AFM data.

/// Widths for a single standard font face.
#[derive(Debug)]
pub struct StandardFontMetrics {
    /// Widths for U+0020..=U+007E.
    ascii: &'static [u16; 95],
    /// Widths for the characters of [`punctuation_slot`], by slot.
    punctuation: [u16; 12],
    /// Used when a character has no entry.
    default_width: u16,
    // Latin-1 glyphs whose width differs from their base letter.
    question_down: u16,
    exclam_down: u16,
    o_slash: u16,
    accented_i: u16,
}

impl StandardFontMetrics {
    /// Width of `ch` in points at `font_size`.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.units(ch) as f64 / 1000.0 * font_size
    }

    /// Width of `text` in points at `font_size`.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }

    fn units(&self, ch: char) -> u16 {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) {
            return self.ascii[(cp - 0x20) as usize];
        }
        if let Some(slot) = punctuation_slot(ch) {
            return self.punctuation[slot];
        }
        match ch {
            '\u{00A0}' => self.ascii[0],
            '¿' => self.question_down,
            '¡' => self.exclam_down,
            'ø' => self.o_slash,
            'ì' | 'í' | 'î' | 'ï' => self.accented_i,
            _ => match base_letter(ch) {
                Some(base) => self.units(base),
                None => self.default_width,
            },
        }
    }
}

/// Slot in [`StandardFontMetrics::punctuation`]. Paired glyphs share a
/// slot; they have equal widths in every standard face.
fn punctuation_slot(ch: char) -> Option<usize> {
    let slot = match ch {
        'º' => 0,
        'ª' => 1,
        '°' => 2,
        '«' | '»' => 3,
        '·' => 4,
        '–' => 5,
        '—' => 6,
        '…' => 7,
        '‘' | '’' => 8,
        '“' | '”' => 9,
        '•' => 10,
        '€' => 11,
        _ => return None,
    };
    Some(slot)
}

/// Map a Latin-1 accented letter to its unaccented base letter.
fn base_letter(ch: char) -> Option<char> {
    let base = match ch {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'Ç' => 'C',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'Ñ' => 'N',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'Ý' => 'Y',
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(base)
}

#[rustfmt::skip]
static HELVETICA_ASCII: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD_ASCII: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    333, 333, 584, 584, 584, 611, 975,
    // A-Z
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    333, 278, 333, 584, 556, 333,
    // a-z
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    // { | } ~
    389, 280, 389, 584,
];

#[rustfmt::skip]
static TIMES_ROMAN_ASCII: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

#[rustfmt::skip]
static TIMES_BOLD_ASCII: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 930,
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
    722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
    333, 278, 333, 581, 500, 333,
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
    556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
    394, 220, 394, 520,
];

static COURIER_ASCII: [u16; 95] = [600; 95];

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_ASCII,
    punctuation: [365, 370, 400, 556, 278, 556, 1000, 1000, 222, 333, 350, 556],
    default_width: 556,
    question_down: 611,
    exclam_down: 333,
    o_slash: 611,
    accented_i: 278,
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_BOLD_ASCII,
    punctuation: [365, 370, 400, 556, 278, 556, 1000, 1000, 278, 500, 350, 556],
    default_width: 556,
    question_down: 611,
    exclam_down: 333,
    o_slash: 611,
    accented_i: 278,
};

pub static TIMES_ROMAN: StandardFontMetrics = StandardFontMetrics {
    ascii: &TIMES_ROMAN_ASCII,
    punctuation: [310, 276, 400, 500, 250, 500, 1000, 1000, 333, 444, 350, 500],
    default_width: 500,
    question_down: 444,
    exclam_down: 333,
    o_slash: 500,
    accented_i: 278,
};

pub static TIMES_BOLD: StandardFontMetrics = StandardFontMetrics {
    ascii: &TIMES_BOLD_ASCII,
    punctuation: [330, 300, 400, 500, 250, 500, 1000, 1000, 333, 500, 350, 500],
    default_width: 500,
    question_down: 500,
    exclam_down: 333,
    o_slash: 500,
    accented_i: 278,
};

pub static COURIER: StandardFontMetrics = StandardFontMetrics {
    ascii: &COURIER_ASCII,
    punctuation: [600; 12],
    default_width: 600,
    question_down: 600,
    exclam_down: 600,
    o_slash: 600,
    accented_i: 600,
};
