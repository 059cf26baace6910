//! # 아티클 트리 조립
//!
//! 한 번의 `LIKE` 쿼리로 가져온 루트 + 자손 행들을 중첩 트리로 조립합니다.
//! 쿼리 결과는 위상 순서가 아니므로 자식 행이 부모보다 먼저 올 수 있습니다.
//!
//! ## 동작 방식 (arena + index)
//! 1. 모든 행을 입력 순서대로 평평한 배열(arena)에 두고 `id → 인덱스` 맵을 만듭니다.
//! 2. 각 행의 직속 부모(`parent_path`의 마지막 id)를 보고
//!    `부모 id → [자식 인덱스]` 목록을 한 번에 채웁니다. 입력 순서와 무관합니다.
//! 3. 루트에서부터 내려가며 중첩 노드를 만듭니다. 형제는 id 순으로 정렬합니다.
//!
//! 부모가 아직 처리되지 않은 자식을 위한 임시 노드는 필요 없습니다.

use crate::models::{ArticleTreeNode, ArticleTreeRow};
use std::collections::HashMap;
use thiserror::Error;

/// 행 집합이 하나의 서브트리로 맞아떨어지지 않을 때의 에러.
/// 저장된 경로가 일관되면 발생하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("article {0} appears more than once")]
    DuplicateRow(i64),

    #[error("article {id} is outside the subtree of {root_id}")]
    OutsideSubtree { id: i64, root_id: i64 },

    #[error("article {id} refers to missing parent {parent_id}")]
    MissingParent { id: i64, parent_id: i64 },

    #[error("article {id} path does not extend its parent's path")]
    PathMismatch { id: i64 },
}

/// `root_id`를 루트로 하는 트리를 조립합니다.
///
/// # 반환값
/// - `Ok(Some(node))`: 조립된 트리
/// - `Ok(None)`: 행 집합에 루트가 없음
/// - `Err(TreeError)`: 경로가 서로 맞지 않는 행이 있음
pub fn build_tree(
    root_id: i64,
    rows: &[ArticleTreeRow],
) -> Result<Option<ArticleTreeNode>, TreeError> {
    let mut index: HashMap<i64, usize> = HashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        if index.insert(row.id, i).is_some() {
            return Err(TreeError::DuplicateRow(row.id));
        }
    }

    let Some(&root_index) = index.get(&root_id) else {
        return Ok(None);
    };

    let mut children: HashMap<i64, Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        if row.id == root_id {
            continue;
        }
        if !row.parent_path.contains(root_id) {
            return Err(TreeError::OutsideSubtree { id: row.id, root_id });
        }

        // contains(root_id)가 참이면 경로가 비어 있지 않습니다.
        let parent_id = row.parent_path.parent_id().unwrap_or(root_id);
        let parent = index
            .get(&parent_id)
            .map(|&p| &rows[p])
            .ok_or(TreeError::MissingParent { id: row.id, parent_id })?;

        // 자식 경로 = 부모 경로 + 부모 id
        let expected = parent.parent_path.append_id(parent.id);
        if expected.as_ref() != Ok(&row.parent_path) {
            return Err(TreeError::PathMismatch { id: row.id });
        }

        children.entry(parent_id).or_default().push(i);
    }

    for list in children.values_mut() {
        list.sort_by_key(|&i| rows[i].id);
    }

    // 자식 경로가 항상 부모 경로보다 길므로 모든 행이 루트에서 닿습니다.
    Ok(Some(assemble(root_index, rows, &children)))
}

fn assemble(
    index: usize,
    rows: &[ArticleTreeRow],
    children: &HashMap<i64, Vec<usize>>,
) -> ArticleTreeNode {
    let row = &rows[index];

    let nodes = children
        .get(&row.id)
        .map(|list| {
            list.iter()
                .map(|&child| assemble(child, rows, children))
                .collect()
        })
        .unwrap_or_default();

    ArticleTreeNode {
        id: row.id,
        title: row.title.clone(),
        color: row.color.clone(),
        children: nodes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, title: &str, path: &str) -> ArticleTreeRow {
        ArticleTreeRow {
            id,
            title: title.to_string(),
            color: (id % 2 == 0).then(|| "red".to_string()),
            parent_path: path.parse().unwrap(),
        }
    }

    /// 1 ─┬─ 2 ─── 4 ─── 6
    ///    └─ 3 ─── 5
    fn sample_rows() -> Vec<ArticleTreeRow> {
        vec![
            row(1, "root", "#9#"),
            row(2, "a", "#9#1#"),
            row(3, "b", "#9#1#"),
            row(4, "a-1", "#9#1#2#"),
            row(5, "b-1", "#9#1#3#"),
            row(6, "a-1-1", "#9#1#2#4#"),
        ]
    }

    fn edges(node: &ArticleTreeNode, out: &mut Vec<(i64, i64)>) {
        for child in &node.children {
            out.push((node.id, child.id));
            edges(child, out);
        }
    }

    #[test]
    fn builds_nested_tree_from_parent_first_rows() {
        let tree = build_tree(1, &sample_rows()).unwrap().unwrap();

        assert_eq!(tree.title, "root");
        let mut found = Vec::new();
        edges(&tree, &mut found);
        assert_eq!(found, vec![(1, 2), (2, 4), (4, 6), (1, 3), (3, 5)]);
        assert_eq!(tree.children[0].color.as_deref(), Some("red"));
    }

    #[test]
    fn children_before_parents_yields_identical_tree() {
        let parent_first = build_tree(1, &sample_rows()).unwrap();

        let mut children_first = sample_rows();
        children_first.reverse();
        assert_eq!(build_tree(1, &children_first).unwrap(), parent_first);

        let mut shuffled = sample_rows();
        shuffled.swap(0, 5);
        shuffled.swap(1, 3);
        assert_eq!(build_tree(1, &shuffled).unwrap(), parent_first);
    }

    #[test]
    fn root_without_ancestors_is_supported() {
        let rows = vec![row(3, "s", "#1#"), row(1, "r", ""), row(2, "a", "#1#")];
        let tree = build_tree(1, &rows).unwrap().unwrap();
        let ids: Vec<i64> = tree.children.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn missing_root_gives_none() {
        let rows = vec![row(2, "a", "#1#")];
        assert_eq!(build_tree(1, &rows), Ok(None));
        assert_eq!(build_tree(1, &[]), Ok(None));
    }

    #[test]
    fn reports_rows_whose_parent_is_absent() {
        let rows = vec![row(1, "r", ""), row(4, "orphan", "#1#2#")];
        assert_eq!(
            build_tree(1, &rows),
            Err(TreeError::MissingParent { id: 4, parent_id: 2 })
        );
    }

    #[test]
    fn reports_inconsistent_paths() {
        // 2의 실제 경로는 #1#인데 자식 3은 #7#2#로 기록되어 있음
        let rows = vec![row(1, "r", ""), row(2, "a", "#1#"), row(3, "b", "#1#7#2#")];
        assert_eq!(build_tree(1, &rows), Err(TreeError::PathMismatch { id: 3 }));

        let rows = vec![row(1, "r", ""), row(5, "x", "#8#")];
        assert_eq!(
            build_tree(1, &rows),
            Err(TreeError::OutsideSubtree { id: 5, root_id: 1 })
        );

        let rows = vec![row(1, "r", ""), row(1, "again", "")];
        assert_eq!(build_tree(1, &rows), Err(TreeError::DuplicateRow(1)));
    }

    mod properties {
        use super::*;
        use crate::services::path::IdPath;
        use proptest::prelude::*;
        use proptest::sample::Index;

        fn count(node: &ArticleTreeNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }

        fn siblings_sorted(node: &ArticleTreeNode) -> bool {
            node.children.windows(2).all(|w| w[0].id < w[1].id)
                && node.children.iter().all(siblings_sorted)
        }

        /// 임의 모양의 서브트리 행 목록. id는 섞여 있어 부모 id가 자식보다 클 수도 있습니다.
        /// `parents[i]`는 `i + 1`번째 노드의 부모를 앞쪽 노드 중에서 고릅니다.
        fn subtree_rows() -> impl Strategy<Value = (i64, Vec<ArticleTreeRow>)> {
            prop::collection::vec(any::<Index>(), 0..48).prop_flat_map(|parents| {
                let n = parents.len() + 1;
                let ids: Vec<i64> = (1..=n as i64).collect();
                (Just(parents), Just(ids).prop_shuffle())
            })
            .prop_map(|(parents, ids)| {
                // 루트 위에 조상 두 개를 둡니다.
                let ancestors = IdPath::from_id_array(vec![1_000, 1_001]).unwrap();
                let mut paths = vec![ancestors];
                for (i, parent) in parents.iter().enumerate() {
                    let p = parent.index(i + 1);
                    let path = paths[p].append_id(ids[p]).unwrap();
                    paths.push(path);
                }
                let rows = ids
                    .iter()
                    .zip(paths)
                    .map(|(&id, parent_path)| ArticleTreeRow {
                        id,
                        title: format!("article {id}"),
                        color: None,
                        parent_path,
                    })
                    .collect();
                (ids[0], rows)
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(128))]

            #[test]
            fn any_row_order_builds_the_same_tree(
                (root_id, rows, shuffled) in subtree_rows().prop_flat_map(|(root_id, rows)| {
                    (Just(root_id), Just(rows.clone()), Just(rows).prop_shuffle())
                })
            ) {
                let expected = build_tree(root_id, &rows).unwrap().unwrap();
                let actual = build_tree(root_id, &shuffled).unwrap().unwrap();

                prop_assert_eq!(count(&expected), rows.len());
                prop_assert!(siblings_sorted(&expected));
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
