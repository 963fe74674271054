//! search モジュールのテスト

mod solver;
