//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `article`: 아티클 행, 트리 노드, 요청/응답 구조체
//! - `relation`: 즐겨찾기(favorite)와 아티클 간 연결(relation) 행
//!
//! `pub use X::*;`로 재공개하여 `crate::models::Article`처럼 짧게 접근합니다.

pub mod article;
pub mod relation;

pub use article::*;
pub use relation::*;
