//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 데이터베이스와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 서비스 계층(services/)에서 이 모듈의 함수를 호출하여 DB 작업을 수행합니다.
//!
//! 각 하위 모듈:
//! - `articles`: 아티클 CRUD, 경로 기반 자손 조회, 경로 일괄 변경, 검색 쿼리
//! - `relations`: 즐겨찾기와 아티클 간 연결 쿼리

pub mod articles;
pub mod relations;

pub use articles::*;
pub use relations::*;
