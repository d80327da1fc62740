use std::fmt;
use std::str::FromStr;

/// Scalar element of a vector type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    Num,
    Bool,
    /// 32 booleans packed into an unsigned integer.
    Bool32,
}

/// Shader-representable types.
///
/// Every compiled value carries one of these. Types are compared
/// structurally; `Error` is the result of typing a runtime value that has
/// no shader representation and never reaches code generation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Error,
    Num,
    Bool,
    Bool32,
    /// Vector of 2..=4 scalars.
    Vec(Scalar, u8),
    /// Square matrix of numbers, 2..=4 columns.
    Mat(u8),
    /// Rectangular array of a non-array type. Dimensions are outermost first.
    Array(Box<Ty>, Vec<u32>),
}

pub const MAX_VEC_COUNT: usize = 4;

impl Ty {
    pub fn scalar(s: Scalar) -> Ty {
        match s {
            Scalar::Num => Ty::Num,
            Scalar::Bool => Ty::Bool,
            Scalar::Bool32 => Ty::Bool32,
        }
    }

    pub fn num_vec(n: u8) -> Ty {
        Ty::Vec(Scalar::Num, n)
    }

    /// The type of a list of `n` elements of type `elem`.
    ///
    /// Short lists of scalars become vectors, a list of `n` `n`-vectors is
    /// a matrix, 32 booleans pack into a `Bool32`, and anything else that is
    /// representable becomes an array with `n` prepended to its dimensions.
    pub fn list(elem: &Ty, n: usize) -> Ty {
        if n == 0 {
            return Ty::Error;
        }
        let short = (2..=MAX_VEC_COUNT).contains(&n);
        match elem {
            Ty::Error => Ty::Error,
            Ty::Num if short => Ty::Vec(Scalar::Num, n as u8),
            Ty::Bool if short => Ty::Vec(Scalar::Bool, n as u8),
            Ty::Bool if n == 32 => Ty::Bool32,
            Ty::Bool32 if short => Ty::Vec(Scalar::Bool32, n as u8),
            Ty::Vec(Scalar::Num, k) if *k as usize == n => Ty::Mat(*k),
            Ty::Array(base, dims) => {
                let mut all = Vec::with_capacity(dims.len() + 1);
                all.push(n as u32);
                all.extend_from_slice(dims);
                Ty::Array(base.clone(), all)
            }
            other => Ty::Array(Box::new(other.clone()), vec![n as u32]),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error)
    }

    pub fn is_num(&self) -> bool {
        matches!(self, Ty::Num)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Ty::Bool)
    }

    pub fn is_bool32(&self) -> bool {
        matches!(self, Ty::Bool32)
    }

    pub fn is_vec(&self) -> bool {
        matches!(self, Ty::Vec(..))
    }

    pub fn is_num_vec(&self) -> bool {
        matches!(self, Ty::Vec(Scalar::Num, _))
    }

    pub fn is_mat(&self) -> bool {
        matches!(self, Ty::Mat(_))
    }

    /// Num, a vector of Num, or a matrix: the operands of arithmetic.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Num | Ty::Vec(Scalar::Num, _) | Ty::Mat(_))
    }

    /// A value with components that can be indexed.
    pub fn is_list(&self) -> bool {
        self.rank() > 0
    }

    /// A scalar, vector or matrix: anything but an array.
    pub fn is_plex(&self) -> bool {
        !matches!(self, Ty::Error | Ty::Array(..))
    }

    /// Number of components at the outermost level.
    pub fn count(&self) -> usize {
        match self {
            Ty::Error | Ty::Num | Ty::Bool => 1,
            Ty::Bool32 => 32,
            Ty::Vec(_, n) | Ty::Mat(n) => *n as usize,
            Ty::Array(_, dims) => dims.first().copied().unwrap_or(0) as usize,
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            Ty::Error | Ty::Num | Ty::Bool => 0,
            Ty::Bool32 | Ty::Vec(Scalar::Num | Scalar::Bool, _) => 1,
            Ty::Vec(Scalar::Bool32, _) | Ty::Mat(_) => 2,
            Ty::Array(base, dims) => dims.len() + base.rank(),
        }
    }

    /// Type of one component at the outermost level.
    pub fn elem_type(&self) -> Ty {
        match self {
            Ty::Bool32 => Ty::Bool,
            Ty::Vec(s, _) => Ty::scalar(*s),
            Ty::Mat(n) => Ty::num_vec(*n),
            Ty::Array(base, dims) if dims.len() > 1 => {
                Ty::Array(base.clone(), dims[1..].to_vec())
            }
            Ty::Array(base, _) => (**base).clone(),
            _ => Ty::Error,
        }
    }

    /// Number of array dimensions (0 for plex types).
    pub fn plex_array_rank(&self) -> usize {
        match self {
            Ty::Array(_, dims) => dims.len(),
            _ => 0,
        }
    }

    /// Element type of an array, or the type itself for plex types.
    pub fn plex_array_base(&self) -> Ty {
        match self {
            Ty::Array(base, _) => (**base).clone(),
            other => other.clone(),
        }
    }

    pub fn plex_array_dim(&self, axis: usize) -> usize {
        match self {
            Ty::Array(_, dims) => dims.get(axis).copied().unwrap_or(0) as usize,
            _ => 0,
        }
    }

    /// Total number of base elements in an array (1 for plex types).
    pub fn flat_len(&self) -> usize {
        match self {
            Ty::Array(_, dims) => dims.iter().map(|d| *d as usize).product(),
            _ => 1,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Ty::Error => "error".to_string(),
            Ty::Num => "float".to_string(),
            Ty::Bool => "bool".to_string(),
            Ty::Bool32 => "uint".to_string(),
            Ty::Vec(Scalar::Num, n) => format!("vec{}", n),
            Ty::Vec(Scalar::Bool, n) => format!("bvec{}", n),
            Ty::Vec(Scalar::Bool32, n) => format!("uvec{}", n),
            Ty::Mat(n) => format!("mat{}", n),
            Ty::Array(base, dims) => {
                let mut text = base.display();
                for d in dims {
                    text.push_str(&format!("[{}]", d));
                }
                text
            }
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl FromStr for Ty {
    type Err = String;

    /// Parse a type written with GLSL spellings: `float`, `vec3`, `bvec2`,
    /// `uint`, `uvec4`, `mat3`, `float[3]`, `vec3[2][2]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (head, mut rest) = match s.find('[') {
            Some(pos) => (&s[..pos], &s[pos..]),
            None => (s, ""),
        };
        let base = match head {
            "float" | "num" => Ty::Num,
            "bool" => Ty::Bool,
            "uint" | "bool32" => Ty::Bool32,
            _ => {
                let split = head.char_indices().last().map_or(0, |(i, _)| i);
                let (prefix, digit) = head.split_at(split);
                let n: u8 = digit
                    .parse()
                    .ok()
                    .filter(|n| (2..=4).contains(n))
                    .ok_or_else(|| format!("unknown type '{}'", s))?;
                match prefix {
                    "vec" => Ty::Vec(Scalar::Num, n),
                    "bvec" => Ty::Vec(Scalar::Bool, n),
                    "uvec" => Ty::Vec(Scalar::Bool32, n),
                    "mat" => Ty::Mat(n),
                    _ => return Err(format!("unknown type '{}'", s)),
                }
            }
        };
        let mut dims = Vec::new();
        while !rest.is_empty() {
            let close = rest
                .find(']')
                .ok_or_else(|| format!("unterminated array dimension in '{}'", s))?;
            let dim: u32 = rest[1..close]
                .trim()
                .parse()
                .map_err(|_| format!("bad array dimension in '{}'", s))?;
            if dim == 0 {
                return Err(format!("zero array dimension in '{}'", s));
            }
            dims.push(dim);
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(format!("unexpected '{}' in '{}'", rest, s));
            }
        }
        if dims.is_empty() {
            Ok(base)
        } else {
            Ok(Ty::Array(Box::new(base), dims))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_types() {
        assert_eq!(Ty::list(&Ty::Num, 3), Ty::num_vec(3));
        assert_eq!(Ty::list(&Ty::Bool, 2), Ty::Vec(Scalar::Bool, 2));
        assert_eq!(Ty::list(&Ty::Bool, 32), Ty::Bool32);
        assert_eq!(Ty::list(&Ty::Bool32, 4), Ty::Vec(Scalar::Bool32, 4));
        assert_eq!(Ty::list(&Ty::num_vec(3), 3), Ty::Mat(3));
        assert_eq!(
            Ty::list(&Ty::num_vec(3), 2),
            Ty::Array(Box::new(Ty::num_vec(3)), vec![2])
        );
        assert_eq!(Ty::list(&Ty::Num, 6), Ty::Array(Box::new(Ty::Num), vec![6]));
        assert!(Ty::list(&Ty::Num, 0).is_error());
        assert!(Ty::list(&Ty::Error, 3).is_error());
    }

    #[test]
    fn test_nested_array_prepends_dimension() {
        let row = Ty::list(&Ty::Num, 5);
        let grid = Ty::list(&row, 2);
        assert_eq!(grid, Ty::Array(Box::new(Ty::Num), vec![2, 5]));
        assert_eq!(grid.plex_array_rank(), 2);
        assert_eq!(grid.plex_array_dim(1), 5);
        assert_eq!(grid.flat_len(), 10);
        assert_eq!(grid.elem_type(), row);
    }

    #[test]
    fn test_rank_and_count() {
        assert_eq!(Ty::Num.rank(), 0);
        assert_eq!(Ty::Bool32.rank(), 1);
        assert_eq!(Ty::Bool32.count(), 32);
        assert_eq!(Ty::num_vec(4).rank(), 1);
        assert_eq!(Ty::Vec(Scalar::Bool32, 2).rank(), 2);
        assert_eq!(Ty::Mat(2).rank(), 2);
        assert_eq!(Ty::Mat(2).elem_type(), Ty::num_vec(2));
        let arr = Ty::Array(Box::new(Ty::num_vec(3)), vec![4]);
        assert_eq!(arr.rank(), 2);
        assert_eq!(arr.count(), 4);
        assert!(!arr.is_plex());
        assert!(arr.is_list());
        assert!(!Ty::Num.is_list());
    }

    #[test]
    fn test_parse_round_trip() {
        for name in ["float", "bool", "uint", "vec3", "bvec2", "uvec4", "mat2", "float[3]", "vec3[2][2]"] {
            let ty: Ty = name.parse().unwrap();
            assert_eq!(ty.to_string(), name);
        }
        assert!("vec5".parse::<Ty>().is_err());
        assert!("float[0]".parse::<Ty>().is_err());
        assert!("float[2".parse::<Ty>().is_err());
        assert!("colour".parse::<Ty>().is_err());
    }

    #[test]
    fn test_parse_rejects_non_ascii_names() {
        assert_eq!("vecé".parse::<Ty>(), Err("unknown type 'vecé'".to_string()));
        assert!("é".parse::<Ty>().is_err());
        assert!("mat٣".parse::<Ty>().is_err());
        assert!("bvec2é[2]".parse::<Ty>().is_err());
    }
}
