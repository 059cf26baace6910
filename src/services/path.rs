//! # 조상 경로(Materialized Path) 코덱
//!
//! 아티클 트리의 조상 체인을 하나의 문자열 컬럼(`parent_path`)에 담기 위한 코덱입니다.
//!
//! ## 인코딩 규칙
//! - 루트 아티클: `""` (빈 문자열)
//! - 그 외: `#a1#a2#...#an#` (`a1`이 가장 바깥 조상, `an`이 직속 부모)
//!
//! 모든 id가 양쪽에 `#`를 가지므로 `LIKE '%#1#%'`는 id `12`와 절대 매칭되지 않습니다.
//!
//! 비즈니스 로직에서는 문자열 대신 [`IdPath`] 타입만 다룹니다.
//! 문자열은 DB에 쓸 때(`Display`)와 읽을 때(`FromStr`, `TryFrom<String>`)에만 등장합니다.
//! 같은 코덱이 `tag_ids`(순서 없는 태그 id 집합)에도 재사용됩니다.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 경로 구분자
pub const DELIMITER: char = '#';

/// 경로 문자열 또는 id 목록이 불변식을 어겼을 때의 에러
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path must start and end with '#': {0:?}")]
    MissingDelimiter(String),

    #[error("empty segment in path: {0:?}")]
    EmptySegment(String),

    #[error("invalid id segment: {0:?}")]
    InvalidId(String),

    #[error("id must be positive: {0}")]
    NonPositiveId(i64),

    #[error("id appears more than once: {0}")]
    DuplicateId(i64),

    #[error("path {path} does not start with {prefix}")]
    PrefixMismatch { path: String, prefix: String },
}

/// 순서가 있는 id 체인 (가장 바깥 조상이 먼저)
///
/// 생성자가 불변식을 보장합니다:
/// - 모든 id는 양수
/// - 같은 id가 두 번 나오지 않음 (체인 안에서 순환 불가)
///
/// JSON으로는 id 배열(`[1, 2, 3]`)로 직렬화됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<i64>")]
pub struct IdPath(Vec<i64>);

impl IdPath {
    /// 루트 아티클의 경로 (조상 없음)
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// id 목록으로 경로를 만듭니다 (`fromIdArray`).
    pub fn from_id_array(ids: Vec<i64>) -> Result<Self, PathError> {
        let mut seen = HashSet::with_capacity(ids.len());
        for &id in &ids {
            if id <= 0 {
                return Err(PathError::NonPositiveId(id));
            }
            if !seen.insert(id) {
                return Err(PathError::DuplicateId(id));
            }
        }
        Ok(Self(ids))
    }

    /// 태그 id 집합을 만듭니다. 순서는 의미가 없으므로 정렬하고 중복은 합칩니다.
    pub fn tag_set(ids: impl IntoIterator<Item = i64>) -> Result<Self, PathError> {
        let mut ids: Vec<i64> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self::from_id_array(ids)
    }

    /// 체인의 id들을 바깥 조상부터 순서대로 돌려줍니다 (`toIdArray`).
    pub fn to_id_array(&self) -> &[i64] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.contains(&id)
    }

    /// 직속 부모 id. 빈 경로(루트)면 `None`입니다.
    pub fn parent_id(&self) -> Option<i64> {
        self.0.last().copied()
    }

    /// 체인 끝에 id를 붙인 새 경로를 반환합니다 (`appendId`).
    ///
    /// 부모의 `parent_path`에 부모 id를 붙이면 자식의 `parent_path`가 되고,
    /// 자기 경로에 자기 id를 붙이면 자손 조회에 쓰는 "전체 경로"가 됩니다.
    pub fn append_id(&self, id: i64) -> Result<Self, PathError> {
        if id <= 0 {
            return Err(PathError::NonPositiveId(id));
        }
        if self.contains(id) {
            return Err(PathError::DuplicateId(id));
        }
        let mut ids = self.0.clone();
        ids.push(id);
        Ok(Self(ids))
    }

    /// 체인에서 id 하나를 제거합니다 (`removeId`). 없으면 그대로 반환합니다.
    /// 문자열 기준으로는 `#id#`가 빠지고 양옆 구분자가 하나로 합쳐집니다.
    pub fn remove_id(&self, id: i64) -> Self {
        let mut ids = self.0.clone();
        if let Some(pos) = ids.iter().position(|&x| x == id) {
            ids.remove(pos);
        }
        Self(ids)
    }

    /// 직속 부모만 `new_parent_id`로 바꿉니다 (`replaceParentId`).
    /// 빈 경로는 `#new_parent_id#`가 됩니다.
    pub fn replace_parent_id(&self, new_parent_id: i64) -> Result<Self, PathError> {
        let mut ids = self.0.clone();
        ids.pop();
        ids.push(new_parent_id);
        Self::from_id_array(ids)
    }

    /// 앞부분 `old_prefix`를 `new_prefix`로 교체하고 나머지는 그대로 둡니다.
    ///
    /// 서브트리 이동 후 자손 경로가 이 값과 같은지 서비스 계층이 검사합니다.
    pub fn rebase(&self, old_prefix: &IdPath, new_prefix: &IdPath) -> Result<Self, PathError> {
        let rest = self
            .0
            .strip_prefix(old_prefix.0.as_slice())
            .ok_or_else(|| PathError::PrefixMismatch {
                path: self.to_string(),
                prefix: old_prefix.to_string(),
            })?;
        let mut ids = new_prefix.0.clone();
        ids.extend_from_slice(rest);
        Self::from_id_array(ids)
    }
}

/// id가 체인 어딘가에 포함된 행을 찾는 패턴: `%#id#%`
///
/// `parent_path`에 쓰면 자손 조회, `tag_ids`에 쓰면 태그 포함 조회가 됩니다.
pub fn id_pattern(id: i64) -> String {
    format!("%{DELIMITER}{id}{DELIMITER}%")
}

/// 직속 자식 패턴: 경로가 정확히 `#id#`로 끝나는 행 (`%#id#`)
pub fn child_pattern(id: i64) -> String {
    format!("%{DELIMITER}{id}{DELIMITER}")
}

// ── 영속성 경계: 문자열 인코딩/디코딩 ──

impl fmt::Display for IdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        write!(f, "{DELIMITER}")?;
        for id in &self.0 {
            write!(f, "{id}{DELIMITER}")?;
        }
        Ok(())
    }
}

impl FromStr for IdPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        // 앞뒤 구분자를 떼어내면 split 결과에 빈 조각이 남지 않습니다.
        // 남는다면 `##` 같은 잘못된 입력입니다.
        let inner = s
            .strip_prefix(DELIMITER)
            .and_then(|rest| rest.strip_suffix(DELIMITER))
            .ok_or_else(|| PathError::MissingDelimiter(s.to_string()))?;

        let ids = inner
            .split(DELIMITER)
            .map(|segment| parse_segment(s, segment))
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_id_array(ids)
    }
}

/// 숫자만 허용하고 앞자리 0은 거부합니다. `+5`나 `05`를 받아들이면
/// 다시 인코딩한 문자열이 원본과 달라져 LIKE 매칭이 어긋납니다.
fn parse_segment(path: &str, segment: &str) -> Result<i64, PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment(path.to_string()));
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) || segment.starts_with('0') {
        return Err(PathError::InvalidId(segment.to_string()));
    }
    segment
        .parse()
        .map_err(|_| PathError::InvalidId(segment.to_string()))
}

impl TryFrom<String> for IdPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<Vec<i64>> for IdPath {
    type Error = PathError;

    fn try_from(value: Vec<i64>) -> Result<Self, Self::Error> {
        Self::from_id_array(value)
    }
}

impl From<IdPath> for Vec<i64> {
    fn from(path: IdPath) -> Self {
        path.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(ids: &[i64]) -> IdPath {
        IdPath::from_id_array(ids.to_vec()).unwrap()
    }

    #[test]
    fn encodes_root_as_empty_string() {
        assert_eq!(IdPath::root().to_string(), "");
        assert_eq!("".parse::<IdPath>().unwrap(), IdPath::root());
    }

    #[test]
    fn encodes_delimiter_on_both_sides_of_every_id() {
        assert_eq!(path(&[1]).to_string(), "#1#");
        assert_eq!(path(&[1, 12, 7]).to_string(), "#1#12#7#");
    }

    #[test]
    fn id_array_round_trip() {
        for ids in [vec![], vec![5], vec![1, 2, 3], vec![42, 7, 1000, 3]] {
            let encoded = IdPath::from_id_array(ids.clone()).unwrap().to_string();
            let decoded: IdPath = encoded.parse().unwrap();
            assert_eq!(decoded.to_id_array(), ids.as_slice());
        }
    }

    #[test]
    fn parent_id_is_last_segment_of_chain() {
        assert_eq!("".parse::<IdPath>().unwrap().parent_id(), None);
        assert_eq!("#1#".parse::<IdPath>().unwrap().parent_id(), Some(1));
        assert_eq!("#1#2#".parse::<IdPath>().unwrap().parent_id(), Some(2));
        assert_eq!("#3#17#250#".parse::<IdPath>().unwrap().parent_id(), Some(250));
    }

    #[test]
    fn append_then_parent_returns_appended_id() {
        for base in [IdPath::root(), path(&[1]), path(&[1, 3])] {
            let appended = base.append_id(9).unwrap();
            assert_eq!(appended.parent_id(), Some(9));
            assert!(appended.to_string().ends_with("9#"));
            assert_eq!(appended.to_id_array()[..base.to_id_array().len()], *base.to_id_array());
        }
        assert_eq!(IdPath::root().append_id(4).unwrap().to_string(), "#4#");
        assert_eq!(path(&[1, 2]).append_id(4).unwrap().to_string(), "#1#2#4#");
    }

    #[test]
    fn append_rejects_id_already_in_chain() {
        assert_eq!(path(&[1, 2]).append_id(1), Err(PathError::DuplicateId(1)));
        assert_eq!(path(&[1]).append_id(0), Err(PathError::NonPositiveId(0)));
    }

    #[test]
    fn remove_id_collapses_delimiters() {
        assert_eq!(path(&[1, 2, 3]).remove_id(2).to_string(), "#1#3#");
        assert_eq!(path(&[1]).remove_id(1).to_string(), "");
        assert_eq!(path(&[1, 2]).remove_id(9), path(&[1, 2]));
    }

    #[test]
    fn replace_parent_keeps_outer_ancestors() {
        assert_eq!(path(&[1, 2]).replace_parent_id(5).unwrap().to_string(), "#1#5#");
        assert_eq!(IdPath::root().replace_parent_id(5).unwrap().to_string(), "#5#");
        assert_eq!(
            path(&[1, 2]).replace_parent_id(1),
            Err(PathError::DuplicateId(1))
        );
    }

    #[test]
    fn rebase_swaps_only_the_prefix() {
        let descendant = path(&[1, 2, 8, 9]);
        let moved = descendant.rebase(&path(&[1, 2]), &path(&[1, 3, 2])).unwrap();
        assert_eq!(moved.to_string(), "#1#3#2#8#9#");

        assert!(matches!(
            descendant.rebase(&path(&[4]), &path(&[5])),
            Err(PathError::PrefixMismatch { .. })
        ));
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(matches!("1#2#".parse::<IdPath>(), Err(PathError::MissingDelimiter(_))));
        assert!(matches!("#1#2".parse::<IdPath>(), Err(PathError::MissingDelimiter(_))));
        assert!(matches!("#".parse::<IdPath>(), Err(PathError::MissingDelimiter(_))));
        assert!(matches!("##".parse::<IdPath>(), Err(PathError::EmptySegment(_))));
        assert!(matches!("#1##2#".parse::<IdPath>(), Err(PathError::EmptySegment(_))));
        assert!(matches!("#a#".parse::<IdPath>(), Err(PathError::InvalidId(_))));
        assert!(matches!("#+5#".parse::<IdPath>(), Err(PathError::InvalidId(_))));
        assert!(matches!("#05#".parse::<IdPath>(), Err(PathError::InvalidId(_))));
        assert_eq!("#1#2#1#".parse::<IdPath>(), Err(PathError::DuplicateId(1)));
    }

    #[test]
    fn tag_set_ignores_order_and_duplicates() {
        let tags = IdPath::tag_set([12, 3, 7, 3]).unwrap();
        assert_eq!(tags.to_string(), "#3#7#12#");
        assert!(IdPath::tag_set([1, -2]).is_err());
    }

    #[test]
    fn patterns_keep_ids_delimited() {
        assert_eq!(id_pattern(1), "%#1#%");
        assert_eq!(child_pattern(12), "%#12#");
    }

    #[test]
    fn serializes_as_id_array() {
        let json = serde_json::to_string(&path(&[1, 2])).unwrap();
        assert_eq!(json, "[1,2]");
        assert!(serde_json::from_str::<IdPath>("[1,1]").is_err());
    }

    // ── 속성 테스트: 임의의 id 체인에 대해 ──

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// 서로 다른 양수 id 체인 (순서 임의)
        fn id_chain() -> impl Strategy<Value = Vec<i64>> {
            prop::collection::hash_set(1i64..=i64::MAX, 0..16)
                .prop_map(|set| set.into_iter().collect::<Vec<_>>())
                .prop_shuffle()
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(256))]

            #[test]
            fn encode_decode_round_trip(ids in id_chain()) {
                let path = IdPath::from_id_array(ids.clone()).unwrap();
                let decoded: IdPath = path.to_string().parse().unwrap();
                prop_assert_eq!(decoded.to_id_array(), ids.as_slice());
            }

            #[test]
            fn decoded_strings_re_encode_identically(raw in "(#[0-9]{1,4}){0,6}#?") {
                // 디코딩에 성공한 문자열은 정규형이어야 합니다.
                if let Ok(path) = raw.parse::<IdPath>() {
                    prop_assert_eq!(path.to_string(), raw);
                }
            }

            #[test]
            fn append_and_parent_are_inverse(ids in id_chain(), extra in 1i64..=i64::MAX) {
                let base = IdPath::from_id_array(ids.clone()).unwrap();
                match base.append_id(extra) {
                    Ok(appended) => {
                        prop_assert!(!ids.contains(&extra));
                        prop_assert_eq!(appended.parent_id(), Some(extra));
                        prop_assert_eq!(appended.remove_id(extra), base);
                    }
                    Err(err) => {
                        prop_assert!(ids.contains(&extra));
                        prop_assert_eq!(err, PathError::DuplicateId(extra));
                    }
                }
            }

            #[test]
            fn id_pattern_matches_only_whole_segments(ids in id_chain(), target in 1i64..10_000) {
                // LIKE '%#n#%'와 같은 부분 문자열 검사
                let encoded = IdPath::from_id_array(ids.clone()).unwrap().to_string();
                let needle = id_pattern(target).trim_matches('%').to_string();
                prop_assert_eq!(encoded.contains(&needle), ids.contains(&target));
            }

            #[test]
            fn rebase_keeps_suffix(prefix in id_chain(), suffix in id_chain(), new_root in 1i64..=i64::MAX) {
                let mut full = prefix.clone();
                full.extend(suffix.iter().filter(|id| !prefix.contains(id)));
                prop_assume!(!full.contains(&new_root));

                let path = IdPath::from_id_array(full.clone()).unwrap();
                let old_prefix = IdPath::from_id_array(prefix.clone()).unwrap();
                let new_prefix = IdPath::from_id_array(vec![new_root]).unwrap();
                let moved = path.rebase(&old_prefix, &new_prefix).unwrap();

                prop_assert_eq!(moved.to_id_array()[0], new_root);
                prop_assert_eq!(&moved.to_id_array()[1..], &full[prefix.len()..]);
            }
        }
    }
}
