// SPDX-License-Identifier: MPL-2.0

//! Text normalization for comparing OCR output against user-typed values.

/// Upper-case `s` and fold accented Latin vowels to their base letter.
///
/// Only the vowel classes common in Portuguese names are folded; `Ç`, digits
/// and punctuation pass through untouched.
pub fn normalize(s: &str) -> String {
    s.to_uppercase().chars().map(fold_vowel).collect()
}

fn fold_vowel(c: char) -> char {
    match c {
        'Ã' | 'Á' | 'À' | 'Â' | 'Ä' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        other => other,
    }
}
