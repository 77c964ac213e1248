//! List marker styles and index-based numbering

/// How an ordered list numbers its items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberStyle {
    #[default]
    Bullet,
    Roman,
    Arabic,
    Alpha,
}

impl NumberStyle {
    /// Read a declared style name (`style` or `class` of a list element)
    pub fn from_declared(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("roman") {
            NumberStyle::Roman
        } else if name.contains("arab") || name.contains("numer") || name.contains("decimal") {
            NumberStyle::Arabic
        } else if name.contains("alpha") || name.contains("letr") || name.contains("letter") {
            NumberStyle::Alpha
        } else {
            NumberStyle::Bullet
        }
    }

    /// Marker for the 1-origin `index`
    pub fn marker(&self, index: usize) -> String {
        match self {
            NumberStyle::Bullet => "•".to_string(),
            NumberStyle::Roman => to_roman(index),
            NumberStyle::Arabic => index.to_string(),
            NumberStyle::Alpha => to_alpha(index),
        }
    }
}

/// Uppercase Roman numeral; 0 has no numeral and renders as `0`
pub fn to_roman(mut n: usize) -> String {
    if n == 0 {
        return "0".to_string();
    }

    const TABLE: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut out = String::new();
    for (value, numeral) in TABLE {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// A, B, … Z, AA, AB, …
pub fn to_alpha(mut n: usize) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    out.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roman() {
        let first: Vec<_> = (1..=10).map(to_roman).collect();
        assert_eq!(first, vec!["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"]);
        assert_eq!(to_roman(14), "XIV");
        assert_eq!(to_roman(1994), "MCMXCIV");
    }

    #[test]
    fn test_alpha() {
        assert_eq!(to_alpha(1), "A");
        assert_eq!(to_alpha(26), "Z");
        assert_eq!(to_alpha(27), "AA");
        assert_eq!(to_alpha(28), "AB");
    }

    #[test]
    fn test_declared_styles() {
        assert_eq!(NumberStyle::from_declared("roman"), NumberStyle::Roman);
        assert_eq!(NumberStyle::from_declared("lista-romana"), NumberStyle::Roman);
        assert_eq!(NumberStyle::from_declared("numeric"), NumberStyle::Arabic);
        assert_eq!(NumberStyle::from_declared("letras"), NumberStyle::Alpha);
        assert_eq!(NumberStyle::from_declared("puntos"), NumberStyle::Bullet);
        assert_eq!(NumberStyle::Alpha.marker(3), "C");
        assert_eq!(NumberStyle::Arabic.marker(3), "3");
    }
}
