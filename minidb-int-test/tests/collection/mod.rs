mod insert_test;
mod people_scenario_test;
mod remove_test;
mod select_test;
mod update_test;
