//! Method Resolution Order (MRO) computation using C3 linearization.
//!
//! Attribute lookup on a class follows its MRO: the class itself, then its
//! ancestors in C3 order. Slot inference uses it to find the class that
//! supplies an inherited `__slots__`.
//!
//! # Algorithm
//!
//! C3 linearization guarantees that:
//!
//! - Children precede their parents
//! - Bases keep the order they are listed in
//! - A consistent ordering exists across the hierarchy
//!
//! The computation is generic over the class key; the caller supplies the
//! direct bases of each class.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use slotinfer_python::mro::compute_mro;
//!
//! let mut hierarchy: HashMap<&str, Vec<&str>> = HashMap::new();
//! hierarchy.insert("D", vec!["B", "C"]);
//! hierarchy.insert("B", vec!["A"]);
//! hierarchy.insert("C", vec!["A"]);
//! hierarchy.insert("A", vec![]);
//!
//! let mro = compute_mro("D", &mut |c: &&str| {
//!     Ok::<_, ()>(hierarchy.get(c).cloned().unwrap_or_default())
//! })
//! .unwrap();
//! assert_eq!(mro, vec!["D", "B", "C", "A"]);
//! ```

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during MRO computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MroError<K, E> {
    /// No valid C3 linearization exists for the class.
    InconsistentHierarchy(K),
    /// The class is its own ancestor.
    Cycle(K),
    /// Resolving the bases of a class failed.
    Bases(E),
}

// ============================================================================
// MRO Computation
// ============================================================================

/// Compute the MRO of `class`.
///
/// `bases_of` returns the direct bases of a class in declaration order.
/// Linearizations of shared ancestors are computed once.
pub fn compute_mro<K, E, F>(class: K, bases_of: &mut F) -> Result<Vec<K>, MroError<K, E>>
where
    K: Clone + Eq + Hash,
    F: FnMut(&K) -> Result<Vec<K>, E>,
{
    let mut visiting = HashSet::new();
    let mut done = HashMap::new();
    compute_mro_internal(class, bases_of, &mut visiting, &mut done)
}

/// Internal MRO computation with cycle detection.
fn compute_mro_internal<K, E, F>(
    class: K,
    bases_of: &mut F,
    visiting: &mut HashSet<K>,
    done: &mut HashMap<K, Vec<K>>,
) -> Result<Vec<K>, MroError<K, E>>
where
    K: Clone + Eq + Hash,
    F: FnMut(&K) -> Result<Vec<K>, E>,
{
    if let Some(mro) = done.get(&class) {
        return Ok(mro.clone());
    }
    if !visiting.insert(class.clone()) {
        return Err(MroError::Cycle(class));
    }

    let bases = bases_of(&class).map_err(MroError::Bases)?;

    let mut seqs: Vec<Vec<K>> = Vec::with_capacity(bases.len() + 1);
    for base in &bases {
        seqs.push(compute_mro_internal(base.clone(), bases_of, visiting, done)?);
    }
    seqs.push(bases);

    let mut mro = vec![class.clone()];
    match merge(&mut seqs) {
        Some(merged) => mro.extend(merged),
        None => return Err(MroError::InconsistentHierarchy(class)),
    }

    visiting.remove(&class);
    done.insert(class, mro.clone());
    Ok(mro)
}

/// C3 merge algorithm for combining linearizations.
///
/// Repeatedly takes the first head that does not appear in the tail of any
/// sequence. Returns `None` when no such head exists.
fn merge<K: Clone + Eq>(seqs: &mut Vec<Vec<K>>) -> Option<Vec<K>> {
    let mut result = Vec::new();

    loop {
        seqs.retain(|seq| !seq.is_empty());

        if seqs.is_empty() {
            return Some(result);
        }

        let candidate = seqs
            .iter()
            .map(|seq| &seq[0])
            .find(|head| !seqs.iter().any(|s| s[1..].contains(*head)))?
            .clone();

        for seq in seqs.iter_mut() {
            if seq.first() == Some(&candidate) {
                seq.remove(0);
            }
        }
        result.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<Vec<&'static str>, MroError<&'static str, String>>;

    fn mro_of(class: &'static str, edges: &[(&'static str, &[&'static str])]) -> TestResult {
        let hierarchy: HashMap<&str, Vec<&str>> =
            edges.iter().map(|(c, b)| (*c, b.to_vec())).collect();
        compute_mro(class, &mut |c: &&'static str| {
            hierarchy
                .get(c)
                .cloned()
                .ok_or_else(|| format!("unknown class {}", c))
        })
    }

    mod linearization {
        use super::*;

        #[test]
        fn single_chain() {
            let mro = mro_of(
                "UselessClass",
                &[
                    ("UselessClass", &["SubClass"]),
                    ("SubClass", &["MiddleClass"]),
                    ("MiddleClass", &["BaseClass"]),
                    ("BaseClass", &["EmptyClass"]),
                    ("EmptyClass", &[]),
                ],
            )
            .unwrap();
            assert_eq!(
                mro,
                vec!["UselessClass", "SubClass", "MiddleClass", "BaseClass", "EmptyClass"]
            );
        }

        #[test]
        fn diamond() {
            let mro = mro_of(
                "D",
                &[("D", &["B", "C"]), ("B", &["A"]), ("C", &["A"]), ("A", &[])],
            )
            .unwrap();
            assert_eq!(mro, vec!["D", "B", "C", "A"]);
        }

        #[test]
        fn textbook_example() {
            // class O; A(O); B(O); C(O); D(O); E(O); K1(A,B,C); K2(D,B,E); K3(D,A); Z(K1,K2,K3)
            let mro = mro_of(
                "Z",
                &[
                    ("O", &[]),
                    ("A", &["O"]),
                    ("B", &["O"]),
                    ("C", &["O"]),
                    ("D", &["O"]),
                    ("E", &["O"]),
                    ("K1", &["A", "B", "C"]),
                    ("K2", &["D", "B", "E"]),
                    ("K3", &["D", "A"]),
                    ("Z", &["K1", "K2", "K3"]),
                ],
            )
            .unwrap();
            assert_eq!(
                mro,
                vec!["Z", "K1", "K2", "K3", "D", "A", "B", "C", "E", "O"]
            );
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn inconsistent_order() {
            // class X(A, B) and class Y(B, A), then class Z(X, Y)
            let err = mro_of(
                "Z",
                &[
                    ("A", &[]),
                    ("B", &[]),
                    ("X", &["A", "B"]),
                    ("Y", &["B", "A"]),
                    ("Z", &["X", "Y"]),
                ],
            )
            .unwrap_err();
            assert_eq!(err, MroError::InconsistentHierarchy("Z"));
        }

        #[test]
        fn cycle() {
            let err = mro_of("A", &[("A", &["B"]), ("B", &["A"])]).unwrap_err();
            assert_eq!(err, MroError::Cycle("A"));
        }

        #[test]
        fn base_resolution_failure() {
            let err = mro_of("A", &[("A", &["Missing"])]).unwrap_err();
            assert_eq!(err, MroError::Bases("unknown class Missing".to_string()));
        }
    }
}
