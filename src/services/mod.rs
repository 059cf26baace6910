//! # 서비스 계층 (Business Logic)
//!
//! 라우트 핸들러와 DB 계층 사이에서 규칙을 담당합니다.
//! - `path`: `#1#2#` 형태의 id 경로 타입과 인코딩/디코딩
//! - `tree`: 평평한 행 목록을 중첩 트리로 조립
//! - `articles`: 아티클 추가/이동/삭제/조회/검색, 즐겨찾기와 연결

pub mod articles;
pub mod path;
pub mod tree;
