mod closure_tests;
mod function_error_tests;
