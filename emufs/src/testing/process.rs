use mockall::mock;

use crate::process::RunningProcess;

mock! {
    pub ProcessNameSource {}

    impl crate::process::ProcessNameSource for ProcessNameSource {
        fn label(&self) -> &'static str;
        fn process_name(&self) -> Option<String>;
    }
}

mock! {
    pub ProcessTable {}

    impl crate::process::ProcessTable for ProcessTable {
        fn running_processes(&self) -> crate::Result<Vec<RunningProcess>>;
    }
}
