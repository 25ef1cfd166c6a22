//! IUPAC nucleotide ambiguity codes.

/// Every base set a call may represent, keyed by its sorted members.
///
/// The gap and the four bases stand for themselves. Sets of four bases have
/// no code here, since such a call carries no information.
const CODES: [(&[u8], u8); 15] = [
    (b"-", b'-'),
    (b"A", b'A'),
    (b"C", b'C'),
    (b"G", b'G'),
    (b"T", b'T'),
    (b"GT", b'K'),
    (b"AC", b'M'),
    (b"AG", b'R'),
    (b"CT", b'Y'),
    (b"CG", b'S'),
    (b"AT", b'W'),
    (b"CGT", b'B'),
    (b"ACG", b'V'),
    (b"ACT", b'H'),
    (b"AGT", b'D'),
];

/// Gets the code for a set of bases.
///
/// `bases` must be sorted. Returns `None` for sets without a code, such as
/// a gap together with a base.
///
/// # Examples
///
/// ```
/// use refcons::consensus::ambiguity;
///
/// assert_eq!(ambiguity::encode(b"AT"), Some(b'W'));
/// assert_eq!(ambiguity::encode(b"C"), Some(b'C'));
/// assert_eq!(ambiguity::encode(b"-A"), None);
/// assert_eq!(ambiguity::encode(b"ACGT"), None);
/// ```
pub fn encode(bases: &[u8]) -> Option<u8> {
    CODES
        .iter()
        .find(|(set, _)| *set == bases)
        .map(|(_, code)| *code)
}

/// Gets the sorted set of bases a code stands for.
///
/// # Examples
///
/// ```
/// use refcons::consensus::ambiguity;
///
/// assert_eq!(ambiguity::decode(b'D'), Some(b"AGT".as_slice()));
/// assert_eq!(ambiguity::decode(b'N'), None);
/// ```
pub fn decode(code: u8) -> Option<&'static [u8]> {
    CODES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(set, _)| *set)
}

/// Returns whether a called symbol stands for `base`.
///
/// Symbols outside the table stand only for themselves.
pub fn represents(code: u8, base: u8) -> bool {
    match decode(code) {
        Some(set) => set.contains(&base),
        None => code == base,
    }
}
